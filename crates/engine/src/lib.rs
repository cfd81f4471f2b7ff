//! Persistence and derived-state layer of a small retail store.
//!
//! All state lives in one [`StoreDocument`] serialized under a single key of a
//! [`KeyValueStorage`]. An [`Engine`] handle owns the storage and serialises
//! every `load → mutate → save` sequence.
//!
//! ```no_run
//! # async fn run() -> Result<(), engine::EngineError> {
//! use engine::{ClientDraft, Engine};
//!
//! let engine = Engine::builder().build().await?;
//! let ana = engine.save_client(ClientDraft::new("Ana")).await?;
//! let found = engine.client(&ana.id).await;
//! assert_eq!(found, Some(ana));
//! # Ok(())
//! # }
//! ```

pub use cash_flows::{CashFlowDraft, CashFlowEntry, EntryKind};
pub use clients::{Client, ClientDraft};
pub use currency::Currency;
pub use document::{COLLECTIONS, SCHEMA_VERSION, StoreDocument};
pub use error::EngineError;
pub use expenses::{Expense, ExpenseDraft};
pub use money::Money;
pub use ops::{ClientHistory, DEFAULT_STORAGE_KEY, Engine, EngineBuilder, MAX_INSTALLMENTS};
pub use products::{Product, ProductDraft, StockStatus};
pub use receivables::{Receivable, ReceivableDraft, ReceivableStatus};
pub use reports::{
    CashFlowReport, InventoryFilter, InventoryReport, Period, ProductSales, ProfitabilityReport,
    ReceivableStatusFilter, ReceivablesFilter, ReceivablesReport, SalesReport,
};
pub use sales::{PaymentMethod, Sale, SaleDraft, SaleItem, SaleItemDraft};
pub use search::{Searchable, search};
pub use settings::{DEFAULT_LOW_STOCK_THRESHOLD, Settings, SettingsPatch};
pub use statistics::Statistics;
pub use storage::{KeyValueStorage, MemoryStorage, SqliteStorage};
pub use util::{Clock, FixedClock, SystemClock, generate_id};

pub mod cash_flows;
mod clients;
mod currency;
mod document;
mod error;
mod expenses;
pub mod migrate;
mod money;
mod ops;
mod products;
mod receivables;
pub mod reports;
mod sales;
pub mod search;
mod settings;
pub mod statistics;
mod storage;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
