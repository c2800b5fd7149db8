// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod demo;
pub mod filter;
pub mod model;
pub mod state;
pub mod table;

pub use demo::*;
pub use filter::*;
pub use model::*;
pub use state::*;
pub use table::*;
