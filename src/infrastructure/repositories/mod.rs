// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod outcome_repo_impl;
pub mod scraped_data_repo_impl;
