//! Lottery agency client.
//!
//! Reads the agency's bets, ships them to the central server in bounded
//! batches over one connection and reports the agency's winners.

use anyhow::{Context, Error};
use bet_relay::{
    CancellationToken, Client, ClientError, Session, SessionOutcome,
    bets::{BatchSource, BetBatcher, CsvBetReader, source::from_bets},
    session::LogObserver,
};
use br_client::config::{ClientConfig, CliOverrides, bet_from_env};
use ctrlc::set_handler;
use log::{error, info};
use pico_args::Arguments;
use std::{fs::File, io::BufReader};

const HELP: &str = "\
Send an agency's lottery bets to the central server

USAGE:
  br_client [OPTIONS]

OPTIONS:
  --server      HOST:PORT   Server address            [default: env CLI_SERVER_ADDRESS or 127.0.0.1:12345]
  --id          N           Agency id (1-255)          [default: env CLI_ID]
  --batch-size  N           Maximum bets per batch     [default: env CLI_BATCH_MAX_AMOUNT or 100]
  --file        PATH        CSV file with the bets     [default: env CLI_DATA_FILE or ./agency.csv]
  --timeout-ms  MS          Socket read/write timeout  [default: env CLI_SOCKET_TIMEOUT_MS or none]

FLAGS:
  --single                  Send the one bet described by the CLI_* bet variables
  -h, --help                Print help information

ENVIRONMENT:
  CLI_NOMBRE, CLI_APELLIDO, CLI_DOCUMENTO,
  CLI_FECHA_NACIMIENTO, CLI_NUMERO_APOSTADO     Bet fields for --single
  RUST_LOG                                      Log filter [default: info]
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        server_address: pargs.opt_value_from_str("--server")?,
        id: pargs.opt_value_from_str("--id")?,
        batch_max_amount: pargs.opt_value_from_str("--batch-size")?,
        data_file: pargs.opt_value_from_str("--file")?,
        socket_timeout_ms: pargs.opt_value_from_str("--timeout-ms")?,
        single_bet: pargs.contains("--single"),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = ClientConfig::from_env(overrides)?;
    config.validate()?;

    // SIGINT/SIGTERM stop the session before its next batch.
    let token = CancellationToken::new();
    let handler_token = token.clone();
    set_handler(move || handler_token.cancel())?;

    let outcome = if config.single_bet {
        let bet = bet_from_env()?;
        run(&config, BetBatcher::new(from_bets(vec![bet]), 1), token)
    } else {
        let file = File::open(&config.data_file)
            .with_context(|| format!("couldn't open {}", config.data_file.display()))?;
        let bets = CsvBetReader::new(BufReader::new(file));
        run(&config, BetBatcher::new(bets, config.batch_max_amount), token)
    };

    match outcome {
        Ok(SessionOutcome::Done { winners }) => {
            info!(
                "action: exit | result: success | client_id: {} | cant_ganadores: {}",
                config.id,
                winners.len()
            );
            Ok(())
        }
        Ok(SessionOutcome::Stopped) => {
            info!("action: exit | result: success | client_id: {}", config.id);
            Ok(())
        }
        Err(e) => {
            error!(
                "action: exit | result: fail | client_id: {} | error: {e}",
                config.id
            );
            Err(e.into())
        }
    }
}

fn run<B: BatchSource>(
    config: &ClientConfig,
    source: B,
    token: CancellationToken,
) -> Result<SessionOutcome, ClientError> {
    let client = Client::connect(&config.server_address, config.id, config.socket_timeout)?;
    let mut session = Session::new(client, source, LogObserver::new(config.id), token);
    session.run()
}
