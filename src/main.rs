use std::path::PathBuf;
use std::sync::Arc;

use acl_mend::audit::{CancelFlag, Repairer, ScanOptions, Scanner};
use acl_mend::config::Config;
use acl_mend::index::{delete_event, get_event, IndexRegistry, MemoryIndex, SearchIndex};
use acl_mend::query::{AppState, QueryServer};
use acl_mend::storage::DatasetStore;
use acl_mend::store::MemoryRecordStore;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "acl-mend", version, about = "Audit and repair event ACLs in search indices")]
struct Cli {
    /// 配置文件（默认 ~/.config/acl-mend/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 数据目录（index-<name>.json / records.json）
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    org: Option<String>,

    #[arg(long, global = true)]
    user: Option<String>,

    #[arg(long, global = true)]
    page_size: Option<usize>,

    /// 在 stderr 输出扫描统计表
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 统计空 / 损坏的 ACL（只读）
    Audit {
        #[arg(long)]
        index: String,
    },
    /// 从权威存储回填空（可选：损坏）的 ACL
    Repair {
        #[arg(long)]
        index: String,
        #[arg(long)]
        include_broken: bool,
    },
    /// 输出单个事件文档
    Show {
        #[arg(long)]
        index: String,
        id: String,
    },
    /// 从索引删除单个事件
    Delete {
        #[arg(long)]
        index: String,
        id: String,
    },
    /// 启动 HTTP 服务
    Serve {
        #[arg(long)]
        listen: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        cfg.data.dir = dir;
    }
    if let Some(org) = cli.org.clone() {
        cfg.tenant.organization = org;
    }
    if let Some(user) = cli.user.clone() {
        cfg.tenant.user = user;
    }
    if let Some(n) = cli.page_size {
        anyhow::ensure!(n > 0, "--page-size must be >= 1");
        cfg.page_size = n;
    }

    let dataset = DatasetStore::new(cfg.data.dir.clone());
    let registry = open_indices(&cfg, &dataset)?;
    let store = Arc::new(MemoryRecordStore::from_versions(dataset.load_records()?));
    let tenant = cfg.tenant();

    let cancel = CancelFlag::new();
    let options = ScanOptions::default()
        .with_page_size(cfg.page_size)
        .with_cancel(cancel.clone());

    match cli.command {
        Command::Audit { index } => {
            let index = lookup(&registry, &index)?;
            watch_interrupt(cancel);
            let report = tokio::task::spawn_blocking(move || {
                Scanner::new(index.as_ref(), options).audit(&tenant)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if cli.stats {
                eprint!("{}", report.stats);
            }
        }
        Command::Repair {
            index,
            include_broken,
        } => {
            let index = lookup(&registry, &index)?;
            watch_interrupt(cancel);
            // 取消 / 翻页失败时前几页的修复也已落盘，再返回错误
            let report = tokio::task::spawn_blocking(move || {
                Repairer::new(index.as_ref(), store.as_ref(), options)
                    .repair_and_flush(&tenant, include_broken)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if cli.stats {
                for (id, reason) in &report.failures {
                    eprintln!("not fixed: {id}: {reason}");
                }
                eprint!("{}", report.stats);
            }
            if let Some(e) = report.flush_error {
                return Err(anyhow::anyhow!(e).context("repaired ACLs were not persisted"));
            }
        }
        Command::Show { index, id } => {
            let index = lookup(&registry, &index)?;
            let event = get_event(index.as_ref(), &tenant, &id)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Command::Delete { index, id } => {
            let index = lookup(&registry, &index)?;
            delete_event(index.as_ref(), &tenant, &id)?;
            index.flush()?;
        }
        Command::Serve { listen } => {
            let listen = listen.unwrap_or_else(|| cfg.server.listen.clone());
            let server = QueryServer::new(AppState {
                indices: Arc::new(registry),
                store,
                default_tenant: tenant,
                options: ScanOptions::default().with_page_size(cfg.page_size),
            });
            info!("Starting acl-mend server, data dir {:?}", dataset.dir());
            tokio::select! {
                res = server.run(&listen) => res?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
            }
        }
    }

    Ok(())
}

/// 每个配置的索引对应 `index-<name>.json`，修改后 flush 回同一文件
fn open_indices(cfg: &Config, dataset: &DatasetStore) -> anyhow::Result<IndexRegistry> {
    let mut registry = IndexRegistry::new();
    for name in &cfg.indices {
        let events = dataset.load_index(name)?;
        let count = events.len();
        let index = MemoryIndex::with_events(name, events)
            .with_backing_file(dataset.index_path(name));
        info!("Loaded index `{}`: {} events", name, count);
        registry.register(Arc::new(index));
    }
    Ok(registry)
}

fn lookup(registry: &IndexRegistry, name: &str) -> anyhow::Result<Arc<dyn SearchIndex>> {
    registry.get(name).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown index `{}` (configured: {})",
            name,
            registry.names().join(", ")
        )
    })
}

/// Ctrl-C：当前页处理完后停止
fn watch_interrupt(cancel: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });
}
