mod http;
mod kv;

pub use self::http::{
    Http, HttpHeader, HttpRequest, HttpResponse, HttpResult, Reject, UrlError, ValidatedUrl,
};
pub use self::kv::{
    encode_json, read_json, read_string, KeyValue, KeyValueError, KeyValueOperation,
    KeyValueResponse, KeyValueResult, KvError, KvResult, Value,
};

pub use crux_core::render::Render;

use crate::event::Event;
// The Effect derive refers to the app type by name.
use crate::App;

pub type AppHttp = Http<Event>;

// The Effect derive needs the generic capability types, not aliases.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
}
