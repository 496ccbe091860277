// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod attack_handler;
pub mod log_handler;
pub mod plan_handler;
pub mod queue_handler;
pub mod status_handler;
