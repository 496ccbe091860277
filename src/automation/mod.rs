// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 游戏自动化层
//!
//! 会话管理、任务处理器及其注册表。处理器只关心游戏内操作，
//! 调度、恢复和审计由Worker层负责。

pub mod attack_dispatch;
pub mod dispatch;
pub mod registry;
pub mod session;
pub mod traits;
