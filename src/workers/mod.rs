// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 后台工作器
//!
//! 唯一的爬虫工作器消费队列并驱动恢复策略，
//! 留存清理工作器定期做日志与攻击的过期维护。

pub mod crawler_worker;
pub mod manager;
pub mod retention_worker;
pub mod state;
