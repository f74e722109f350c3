mod index;

pub use index::*;

use blockseek_core::ChainSource;

use crate::{
    config::{Config, ConfigFile},
    db::{self, ElasticStore},
};

pub(crate) fn init() -> anyhow::Result<()> {
    let config_file = ConfigFile::example();
    let cfg = toml::to_string(&config_file)?;
    println!("{cfg}");
    Ok(())
}

pub(crate) async fn status(config: &Config, store: &ElasticStore) -> anyhow::Result<()> {
    let head = config.rpc_client()?.latest_height().await?;
    let stats = db::stats::index_stats(store).await?;
    let indices = store.indices();

    println!("Chain head:      {head}");
    match stats.index_height {
        Some(height) => println!("Indexed height:  {height}"),
        None => println!("Indexed height:  none"),
    }
    println!("Blocks:          {} ({})", stats.blocks, indices.block);
    println!("Transactions:    {} ({})", stats.transactions, indices.tx);
    println!("Addresses:       {} ({})", stats.addresses, indices.address);
    Ok(())
}

pub(crate) fn version() {
    let version = env!("CARGO_PKG_VERSION");
    println!("Current version is {version}");
}
