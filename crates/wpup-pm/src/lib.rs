pub mod config;
pub mod error;
pub mod extension;
pub mod fetch;
pub mod http;
pub mod inventory;
pub mod manifest;
pub mod selection;
pub mod session;
pub mod signer;
pub mod stage;

pub use config::UpdaterConfig;
pub use error::{Result, UpdaterError};
pub use extension::{ExtensionPolicy, ExtensionSet, Family};
pub use fetch::{
    package_dir, DownloadTarget, FetchObserver, FetchedPackage, Fetcher, HttpTransport,
    TransferProgress, Transport, TransportMode, WgetTransport,
};
pub use inventory::{ComponentRecord, Inventory};
pub use manifest::ManifestStore;
pub use selection::{Candidate, CandidateList, FilterAction, MatchOutcome, Matcher, SelectionRules, SelectionSet};
pub use session::{OfflineSession, OnlineSession, Operator, SelectionSummary};
pub use signer::{
    CabinetTimestampProbe, CommandSignerInspector, FileTimestampProbe, SignerInfo, SignerInspector,
    Signing, TimestampReport,
};
pub use stage::stage_packages;
