pub mod flow_struct;
pub mod remote_struct;
pub mod response_struct;
pub mod util_struct;
