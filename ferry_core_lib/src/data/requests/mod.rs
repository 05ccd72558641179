mod field_reader;
pub use field_reader::FieldReader;
mod field_writer;
pub use field_writer::FieldWriter;
mod frame_reader;
pub use frame_reader::{FrameReader, MAX_FRAME_LEN};
mod request;
pub use request::{Request, RequestDirection, RequestStatus};
mod request_body;
pub use request_body::{
    decode_request, encode_frame, encode_request, FileEntry, RequestBody, SenderEndpoint,
    TransferCorrelation,
};
mod request_type;
pub use request_type::RequestType;
