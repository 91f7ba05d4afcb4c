//! 作文处理上下文
//!
//! 封装"我正在处理批次中的第几个文件"这一信息

use std::fmt::Display;

use crate::models::InputFile;

/// 作文处理上下文
#[derive(Debug, Clone)]
pub struct EssayCtx {
    pub file: InputFile,

    /// 文件在列表中的位置（从0开始）
    pub index: usize,

    /// 批次文件总数（仅用于日志显示）
    pub total: usize,
}

impl EssayCtx {
    pub fn new(file: InputFile, index: usize, total: usize) -> Self {
        Self { file, index, total }
    }
}

impl Display for EssayCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文件 {}/{} {}]",
            self.index + 1,
            self.total,
            self.file.file_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_one_based() {
        let ctx = EssayCtx::new(InputFile::new("/scans/essay.png"), 0, 3);
        assert_eq!(ctx.to_string(), "[文件 1/3 essay.png]");
    }
}
