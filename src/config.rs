use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::audit::DEFAULT_PAGE_SIZE;
use crate::core::Tenant;

/// `config.toml`：
///
/// ```toml
/// page_size = 100
/// indices = ["adminui", "api"]
///
/// [server]
/// listen = "127.0.0.1:6060"
///
/// [tenant]
/// organization = "mh_default_org"
/// user = "admin"
///
/// [data]
/// dir = "/var/lib/acl-mend"
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub page_size: usize,
    pub indices: Vec<String>,
    pub server: ServerConfig,
    pub tenant: TenantConfig,
    pub data: DataConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    pub organization: String,
    pub user: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            indices: vec!["adminui".to_string(), "api".to_string()],
            server: ServerConfig::default(),
            tenant: TenantConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:6060".to_string(),
        }
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            organization: "mh_default_org".to_string(),
            user: "admin".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            dir: base.join("acl-mend"),
        }
    }
}

impl Config {
    /// `~/.config/acl-mend/config.toml`（平台相关）
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("acl-mend").join("config.toml"))
    }

    /// 显式路径必须存在；默认路径不存在时使用内置默认值
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        let text = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        let cfg = Self::parse(&text)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(cfg)
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        if cfg.page_size == 0 {
            anyhow::bail!("page_size must be >= 1");
        }
        Ok(cfg)
    }

    pub fn tenant(&self) -> Tenant {
        Tenant::new(&self.tenant.organization, &self.tenant.user)
    }
}
