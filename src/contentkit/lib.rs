//! # Contentkit Architecture
//!
//! Contentkit manages **editable content blocks**: page texts, mail templates,
//! notification bodies. Each block ships with the application and can be
//! overridden at runtime without touching the shipped copy.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, loads contentkit.toml, prints output   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Manager + Item (manager.rs, item.rs)                       │
//! │  - Resolves override → source, strips meta-data fields      │
//! │  - Renders, validates, saves and resets items               │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                               │
//!                  ▼                               ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Storage Layer (store/)       │ │  Render Layer (render/)   │
//! │  - Storage trait              │ │  - Renderer trait         │
//! │  - File, SQLite, in-memory    │ │  - {name}, {{a.b}}, Jinja │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Content Model
//!
//! A content item is a flat map of part name to text (`title`, `body`, ...),
//! addressed by a string key. Keys may contain `/` to group items
//! (`mail/welcome`); file storages map those to sub-directories.
//!
//! The core never writes to stdout/stderr and never exits the process. It
//! logs through `tracing`; the binary decides where that output goes.
//!
//! ## Quick Start
//!
//! ```text
//! let manager = Manager::builder(JsonStorage::new("content"), DbStorage::open(db, "content")?)
//!     .meta_data_fields(["placeholders"])
//!     .build();
//!
//! let item = manager.get("about")?;
//! let html = item.render("body", &data)?;
//! ```
//!
//! ## Testing
//!
//! [`store::memory::MemStorage`] keeps everything in memory and can simulate
//! write failures, so manager and item behaviour is tested without a disk.
//! Each backend is additionally run through the shared conformance suite in
//! `tests/storage_conformance.rs`.

pub mod config;
pub mod error;
pub mod item;
pub mod manager;
pub mod model;
pub mod render;
pub mod store;
pub mod validation;

pub use error::{ContentError, Result};
pub use item::Item;
pub use manager::{Manager, ManagerBuilder};
pub use model::{Fields, RenderData, Supplier};
pub use render::Renderer;
pub use store::Storage;
