//! carbonapi v2 render messages.
//!
//! These mirror `carbonapi_v2_pb.proto` and are used to build protobuf
//! render bodies. Decoding goes through the hand-written reader in
//! [`crate::wire::protobuf`] instead.

#[derive(Clone, PartialEq, prost::Message)]
pub struct FetchResponse {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int32, tag = "2")]
    pub start_time: i32,
    #[prost(int32, tag = "3")]
    pub stop_time: i32,
    #[prost(int32, tag = "4")]
    pub step_time: i32,
    #[prost(double, repeated, tag = "5")]
    pub values: Vec<f64>,
    #[prost(bool, repeated, tag = "6")]
    pub is_absent: Vec<bool>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MultiFetchResponse {
    #[prost(message, repeated, tag = "1")]
    pub metrics: Vec<FetchResponse>,
}

/// Field numbers of [`FetchResponse`].
pub mod fetch_response {
    pub const NAME: u32 = 1;
    pub const START_TIME: u32 = 2;
    pub const STOP_TIME: u32 = 3;
    pub const STEP_TIME: u32 = 4;
    pub const VALUES: u32 = 5;
    pub const IS_ABSENT: u32 = 6;
}

/// Field numbers of [`MultiFetchResponse`].
pub mod multi_fetch_response {
    pub const METRICS: u32 = 1;
}
