use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::core::{AccessControlList, EventRecord};

const RECORDS_FILE: &str = "records.json";

/// 权威存储中的一个版本
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVersion {
    pub event_id: String,
    pub version: u64,
    /// None = 该版本没有快照
    #[serde(default)]
    pub acl: Option<AccessControlList>,
}

/// 数据目录布局：
/// - `index-<name>.json`：某个搜索索引的全部事件文档
/// - `records.json`：权威 ACL 版本
///
/// 写入走原子替换：
/// 1) 写 `<file>.tmp`
/// 2) fsync(tmpfile)
/// 3) rename(tmp, target)
/// 4) fsync(dir)
///
/// 任一步骤前崩溃，target 仍是旧内容。
#[derive(Clone, Debug)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("index-{name}.json"))
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    /// 文件不存在时返回空索引
    pub fn load_index(&self, name: &str) -> anyhow::Result<Vec<EventRecord>> {
        load_or_default(&self.index_path(name))
    }

    pub fn load_records(&self) -> anyhow::Result<Vec<RecordVersion>> {
        load_or_default(&self.records_path())
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> anyhow::Result<T> {
    if !path.exists() {
        tracing::debug!("Dataset file {:?} missing, starting empty", path);
        return Ok(T::default());
    }
    let data = std::fs::read(path)?;
    let value = serde_json::from_slice(&data)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?;
    Ok(value)
}

/// 原子写入 JSON（tmp + fsync + rename + fsync(dir)）
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let mut file = std::fs::File::create(&tmp_path)?;
    {
        let mut w = std::io::BufWriter::new(&mut file);
        serde_json::to_writer_pretty(&mut w, value)?;
        w.flush()?;
    }
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    tracing::debug!("Dataset file written: {:?}", path);
    Ok(())
}
