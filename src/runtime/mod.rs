// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sandboxed module runtime.
//!
//! One [`Sandbox`] per rebuild generation: it eagerly discovers every
//! source file in a freshly loaded tree, creates one unexecuted module per
//! file, and executes each lazily at most once when first required. Module
//! bodies run behind the [`ModuleExecutor`] plugin boundary with an
//! explicit capability record ([`ModuleScope`]); nothing is ambient.

mod executor;
mod module;
mod sandbox;
mod scope;
mod timers;

pub use executor::{ExternalModules, ModuleBody, ModuleExecutor, ModuleRegistry, NoExternalModules};
pub use module::{Exports, ModuleCell, Persisted, Required};
pub use sandbox::Sandbox;
pub use scope::ModuleScope;
pub use timers::TimerSet;
