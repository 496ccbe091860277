// Copyright (c) 2026 twcrawler contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;

pub mod api_test;
pub mod attack_repository_test;
pub mod credential_repository_test;
pub mod log_repository_test;
pub mod plan_repository_test;
