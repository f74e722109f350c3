use crate::{config::Config, db::ElasticStore};

pub async fn index(config: &Config, store: ElasticStore) -> anyhow::Result<()> {
    let engine = config.sync_engine(store)?;
    let catch_up = engine.catch_up().await.map_err(|err| {
        tracing::error!("Indexing error: {err}");
        err
    })?;
    tracing::info!(
        "Indexed {} new block(s) ({} new document(s)) checking heights {} up to chain head {}.",
        catch_up.indexed,
        catch_up.created,
        catch_up.start,
        catch_up.head
    );
    Ok(())
}

pub async fn sync(config: &Config, store: ElasticStore) -> anyhow::Result<()> {
    let engine = config.sync_engine(store)?;
    tracing::info!(
        "Syncing with a {}s idle delay between passes.",
        config.sync_delay().as_secs()
    );
    match engine.run().await {
        Ok(never) => match never {},
        Err(err) => {
            tracing::error!("Sync halted: {err}");
            Err(err.into())
        }
    }
}
