//! Common test utilities and fixtures

#![allow(dead_code)]

use scrivener_core::config::PathsConfig;
use scrivener_core::ScrivenerConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Writing rules document at v1.3
pub const RULES_DOCUMENT: &str = "# ブログ執筆ルール\n\n*バージョン: 1.3*\n\n## 基本方針\n- 読者目線で書く\n\n## 更新履歴\n\n### v1.3 (2024-01-01)\n- コード例を増やす\n\n### 今後の更新予定\n- 検討中\n";

/// Short article with no code, headings or markers
pub const TEST_ARTICLE: &str = "---\ntitle: Test\n---\nThis is a short article body.\n";

/// A post that trips most scoring deductions
pub const THIN_ARTICLE: &str = "---\ntitle: Thin\ndate: 2025-01-01 09:00\n---\n短い記事です。\n";

/// A post with code, headings and most of the markers the scorers look for
pub const RICH_ARTICLE: &str = r#"---
title: Rich
date: 2025-06-01 10:00
---
# なぜこの記事を書こうと思ったのか

最新のAPIとasync処理について、AIの視点で詳しく説明します。

## 概要

キャッシュとは何かを詳しく、そして深く解説します。

## Step 1: インストール

- pip install aiohttp
- 手順に従う
- 実装例を確認
- よくある問題を確認
- パフォーマンスの最適化

### 実装例

```python
# API client
async def main():
    try:
        await fetch()
    except Exception as error:
        print(error)
```

```python
# entry point
if __name__ == "__main__":
    asyncio.run(main())
```

### トラブルシューティング

データベースとの連携で詳細に確認します。class と function の使い方も示します。
"#;

/// Temporary workspace with every path rooted inside it
pub struct Workspace {
    pub dir: TempDir,
    pub config: ScrivenerConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = ScrivenerConfig::default();
        config.paths = PathsConfig::default().rooted_at(dir.path());
        std::fs::create_dir_all(&config.paths.posts_dir).expect("Failed to create posts dir");
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a post into the posts directory
    pub fn post(&self, name: &str, text: &str) -> PathBuf {
        let path = self.config.paths.posts_dir.join(name);
        std::fs::write(&path, text).expect("Failed to write post");
        path
    }

    pub fn write_rules_document(&self) -> PathBuf {
        let path = self.config.paths.rules_document.clone();
        std::fs::write(&path, RULES_DOCUMENT).expect("Failed to write rules");
        path
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).expect("Failed to read file")
    }
}
