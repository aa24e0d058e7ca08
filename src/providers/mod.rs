pub mod bitgo;
pub mod coinbase;
pub mod registry;
pub mod traits;

pub use bitgo::BitGoProvider;
pub use coinbase::CoinbaseLinks;
pub use registry::ProviderRegistry;
pub use traits::{
    Capabilities, CustodyProvider, Operation, PaymentLinkProvider, SendOutcome, SendRequest,
};
