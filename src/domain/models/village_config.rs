// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 村庄小规模攻击配置
///
/// 目标列表按轮询游标依次打击：每次成功派遣后游标
/// 对目标数取模前进。游标是显式存储的整数，不是隐式迭代器。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageConfig {
    /// 配置唯一标识符
    pub id: Uuid,
    /// 服务器ID
    pub server_id: i32,
    /// 村庄ID
    pub village_id: i32,
    /// 目标坐标列表
    pub targets: Vec<String>,
    /// 下一个目标在列表中的下标
    pub next_target_index: i32,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl VillageConfig {
    /// 当前轮询到的目标
    pub fn current_target(&self) -> Option<&str> {
        if self.targets.is_empty() {
            return None;
        }
        let idx = (self.next_target_index.max(0) as usize) % self.targets.len();
        Some(self.targets[idx].as_str())
    }

    /// 成功派遣后前进游标
    pub fn advance_cursor(&mut self) {
        if self.targets.is_empty() {
            self.next_target_index = 0;
            return;
        }
        self.next_target_index = (self.next_target_index + 1) % self.targets.len() as i32;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(targets: Vec<&str>) -> VillageConfig {
        VillageConfig {
            id: Uuid::new_v4(),
            server_id: 1,
            village_id: 10,
            targets: targets.into_iter().map(String::from).collect(),
            next_target_index: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cursor_wraps_around() {
        let mut cfg = config(vec!["500|500", "501|501", "502|502"]);
        assert_eq!(cfg.current_target(), Some("500|500"));
        cfg.advance_cursor();
        cfg.advance_cursor();
        assert_eq!(cfg.current_target(), Some("502|502"));
        cfg.advance_cursor();
        assert_eq!(cfg.current_target(), Some("500|500"));
    }

    #[test]
    fn test_empty_target_list() {
        let mut cfg = config(vec![]);
        assert_eq!(cfg.current_target(), None);
        cfg.advance_cursor();
        assert_eq!(cfg.next_target_index, 0);
    }
}
