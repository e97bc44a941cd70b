// Producers -> bounded queue -> N consumers.
// Run: producer_consumers [CONSUMERS] [ITEMS] [--capacity N] [--producers N] [--delay-us N]

use bounded_queues::workload::{self, Config};
use bounded_queues::ConfigError;
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
   name = "producer_consumers",
   about = "Feeds consumer threads through a bounded closable queue and checks the sum",
   version
)]
struct Cli {
   /// Number of consumer threads.
   #[arg(default_value_t = 4)]
   consumers: usize,
   /// Items each producer generates (0..ITEMS).
   #[arg(default_value_t = 100, allow_negative_numbers = true)]
   items: i64,
   /// Slots in the shared queue.
   #[arg(long, default_value_t = 32)]
   capacity: usize,
   /// Number of producer threads.
   #[arg(long, default_value_t = 1)]
   producers: usize,
   /// Simulated producer work per item, in microseconds.
   #[arg(long = "delay-us", default_value_t = 1000)]
   delay_us: u64,
}

impl TryFrom<&Cli> for Config {
   type Error = ConfigError;

   fn try_from(cli: &Cli) -> Result<Self, ConfigError> {
      let config = Config {
         capacity: cli.capacity,
         producers: cli.producers,
         consumers: cli.consumers,
         items: u64::try_from(cli.items).map_err(|_| ConfigError::NegativeItems)?,
         produce_delay: Duration::from_micros(cli.delay_us),
      };
      config.validate()?;
      Ok(config)
   }
}

fn main() -> ExitCode {
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
      .with_writer(std::io::stderr)
      .init();

   // Argument errors exit 1 like validation errors; clap alone would use 2.
   let cli = match Cli::try_parse() {
      Ok(cli) => cli,
      Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
         err.exit()
      }
      Err(err) => {
         let _ = err.print();
         return ExitCode::from(1);
      }
   };
   let config = match Config::try_from(&cli) {
      Ok(config) => config,
      Err(err) => {
         eprintln!("{err}");
         return ExitCode::from(1);
      }
   };

   println!(
      "starting with {} consumers, {} producers, {} items per producer, capacity {}",
      config.consumers, config.producers, config.items, config.capacity
   );

   match workload::run(&config) {
      Ok(report) => {
         println!(
            "consumers={} producers={} items={} total={} expected={} {}",
            config.consumers,
            config.producers,
            config.items,
            report.total,
            report.expected,
            if report.is_match() { "OK" } else { "MISMATCH" }
         );
         println!("elapsed={:.3?}", report.elapsed);
         ExitCode::SUCCESS
      }
      Err(err) => {
         error!(%err, "run aborted");
         eprintln!("error: {err}");
         ExitCode::from(1)
      }
   }
}
