// ==========================================
// 会员组织管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10485760 (10 MB)
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64>;

    /// 仅允许在全国层级任命的部门名称
    ///
    /// # 默认值
    /// - ["VP Admin", "VP South-West", "VP North", "VP South-South/South-East"]
    async fn get_restricted_departments(&self) -> RepositoryResult<Vec<String>>;

    /// 全国层级的规范 level_id
    ///
    /// # 默认值
    /// - 1
    async fn get_national_level_id(&self) -> RepositoryResult<i64>;

    /// 是否校验“仅会员行”（无部门）的会员存在性
    ///
    /// # 默认值
    /// - false
    ///
    /// # 说明
    /// - 开启后未找到的会员记为 Warning，不计入失败
    async fn get_strict_member_rows(&self) -> RepositoryResult<bool>;
}
