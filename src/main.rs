use config::Commands::*;
use config::*;
use news_indexer::*;

fn main() -> anyhow::Result<()> {
    let args = RootCommand::read();
    let config = Config::read(&args.config)?;

    // The per-article work is almost entirely file reads, so a small thread
    // pool is plenty. Rayon makes the parallel read+extract step so easy that
    // it's not worth reaching for async for a CLI tool like this one.
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency.unwrap_or(8))
        .build()?
        .install(|| main0(args, config))
}

fn main0(args: RootCommand, config: Config) -> anyhow::Result<()> {
    match args.command.unwrap_or(Generate) {
        Generate => {
            index::generate(&config)?;
        }
        Watch => {
            watch::watch(&config)?;
        }
    }

    Ok(())
}
