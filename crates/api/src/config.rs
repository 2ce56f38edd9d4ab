use anyhow::Context;

const PREFIX: &str = "BLOCKSCHED__SERVER__";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = lookup(&format!("{PREFIX}PORT")) {
            cfg.port = v
                .parse()
                .with_context(|| format!("{PREFIX}PORT is not a port number: {v}"))?;
        }
        if let Some(v) = lookup(&format!("{PREFIX}BODY_LIMIT")) {
            cfg.body_limit = v
                .parse()
                .with_context(|| format!("{PREFIX}BODY_LIMIT is not a byte count: {v}"))?;
        }
        Ok(cfg)
    }

    pub fn addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
