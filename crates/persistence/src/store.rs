//! JSON 文件偏好存储
//!
//! 字符串键到 JSON 值的持久化映射，整个映射保存在一个文件中。

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 偏好存储错误
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Preference cache lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, PreferenceError>;

/// 偏好存储
#[derive(Debug)]
pub struct PreferenceStore {
    /// 偏好文件路径
    path: PathBuf,

    /// 值缓存
    values: RwLock<BTreeMap<String, Value>>,

    /// 串行化文件写入
    write_lock: Mutex<()>,
}

impl PreferenceStore {
    /// 打开偏好文件；文件不存在时为空存储
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = Self::load(&path).await?;
        debug!("Opened preferences at {:?} ({} keys)", path, values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
            write_lock: Mutex::new(()),
        })
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 偏好文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.values.read().map_err(|_| PreferenceError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Value>>> {
        self.values.write().map_err(|_| PreferenceError::LockPoisoned)
    }

    /// 读取并反序列化一个值
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let values = self.read()?;
        match values.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 是否存在该键
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    /// 所有键（已排序）
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    /// 写入一个值并持久化
    pub async fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.mutate(|values| {
            values.insert(key.to_string(), value);
        })
        .await
    }

    /// 一次写入多个值（单次文件替换）
    pub async fn set_many<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.mutate(|values| values.extend(entries)).await
    }

    /// 删除一个键；返回是否存在
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let mut existed = false;
        self.mutate(|values| existed = values.remove(key).is_some())
            .await?;
        Ok(existed)
    }

    /// 删除满足条件的所有键，返回删除数量
    pub async fn remove_where<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        let mut removed = 0;
        self.mutate(|values| {
            let before = values.len();
            values.retain(|key, _| !predicate(key));
            removed = before - values.len();
        })
        .await?;
        Ok(removed)
    }

    /// 清空所有偏好
    pub async fn clear(&self) -> Result<()> {
        self.mutate(|values| values.clear()).await
    }

    /// 在副本上修改，写入文件成功后才替换缓存
    async fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, Value>),
    {
        let _guard = self.write_lock.lock().await;

        let mut next = self.read()?.clone();
        f(&mut next);
        let content = serde_json::to_string_pretty(&next)?;

        if let Err(e) = self.persist(&content).await {
            warn!("Failed to write preferences {:?}: {}", self.path, e);
            return Err(e);
        }

        *self.write()? = next;
        Ok(())
    }

    async fn persist(&self, content: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 先写入临时文件，再重命名（原子操作）
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}
