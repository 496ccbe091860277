// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::automation::traits::TaskHandler;
use crate::domain::models::task_kind::TaskKind;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 任务处理器注册表
///
/// 按任务类型索引处理器。一个类型至多一个处理器，
/// 未注册类型的任务由Worker以错误结束。
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    /// 用给定的处理器列表构建注册表
    ///
    /// 后注册的处理器覆盖同类型的先注册者
    pub fn new(handlers: Vec<Arc<dyn TaskHandler>>) -> Self {
        let mut map: HashMap<TaskKind, Arc<dyn TaskHandler>> = HashMap::new();
        for handler in handlers {
            let kind = handler.kind();
            info!(kind = %kind, "Registered task handler");
            map.insert(kind, handler);
        }
        Self { handlers: map }
    }

    /// 查找任务类型对应的处理器
    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// 已注册的任务类型
    pub fn registered_kinds(&self) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|k| k.to_string());
        kinds
    }
}
