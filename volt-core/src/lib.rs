pub mod catalog;
pub mod notify;
pub mod payment;
pub mod renderer;
pub mod shipping;

pub use catalog::{CatalogError, Product, ProductCatalog, ProductCategory};
pub use notify::{Notifier, NotifyError};
pub use payment::{GatewayError, GatewayIntent, GatewayStatus, PaymentGateway};
pub use renderer::ContractRenderer;
pub use shipping::{Address, Parcel, ShippingCarrier, ShippingError};
