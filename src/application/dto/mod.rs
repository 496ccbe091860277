// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod attack_request;
pub mod log_query_request;
pub mod plan_request;
pub mod queue_task_request;
