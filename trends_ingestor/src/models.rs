pub mod observation;
pub mod request_params;
