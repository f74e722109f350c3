use std::time::Duration;

use blockseek_core::SyncEngine;
use url::Url;

use super::{Cli, ConfigFile};
use crate::{
    chain::RpcChainSource,
    db::{ElasticStore, IndexNames},
};

#[derive(Clone, Debug)]
pub struct Config {
    pub cli: Cli,
    pub file: ConfigFile,
}

impl Config {
    pub fn new(cli: Cli, file: ConfigFile) -> Self {
        Self { cli, file }
    }

    pub fn rpc_client(&self) -> anyhow::Result<RpcChainSource> {
        Ok(RpcChainSource::new(self.rpc_url()?, self.rpc_timeout()))
    }

    pub fn elastic(&self) -> anyhow::Result<ElasticStore> {
        ElasticStore::new(
            self.elasticsearch_url()?,
            self.elasticsearch_timeout(),
            self.elasticsearch_auth(),
            self.index_names(),
        )
    }

    pub fn sync_engine(
        &self,
        store: ElasticStore,
    ) -> anyhow::Result<SyncEngine<RpcChainSource, ElasticStore>> {
        Ok(SyncEngine::new(self.rpc_client()?, store, self.sync_delay()))
    }

    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        match &self.file.rpc.url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse("http://127.0.0.1:8545")?),
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.file.rpc.timeout.unwrap_or(Duration::from_secs(30))
    }

    pub fn elasticsearch_url(&self) -> anyhow::Result<Url> {
        match &self.file.elasticsearch.url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse("http://127.0.0.1:9200")?),
        }
    }

    pub fn elasticsearch_timeout(&self) -> Duration {
        self.file
            .elasticsearch
            .timeout
            .unwrap_or(Duration::from_secs(30))
    }

    fn elasticsearch_auth(&self) -> Option<(String, Option<String>)> {
        let es = &self.file.elasticsearch;
        es.user.clone().map(|user| (user, es.password.clone()))
    }

    pub fn index_names(&self) -> IndexNames {
        let es = &self.file.elasticsearch;
        let name = |name: &Option<String>, default: &str| {
            name.clone().unwrap_or_else(|| default.to_string())
        };
        IndexNames {
            block: name(&es.block_index, "block"),
            tx: name(&es.tx_index, "tx"),
            address: name(&es.address_index, "address"),
        }
    }

    pub fn sync_delay(&self) -> Duration {
        self.file.sync.delay.unwrap_or(Duration::from_secs(5))
    }
}
