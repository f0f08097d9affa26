pub mod manual;
pub mod paytm;
pub mod stub;

pub use manual::ManualUpiProvider;
pub use paytm::PaytmProvider;
pub use stub::StubGatewayProvider;
