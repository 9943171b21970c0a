//! Builders for common KNXnet/IP request frames.
//!
//! These return [`Frame`] trees ready for the encoder; everything the
//! schema can compute or default (lengths, protocol version, reserved
//! bytes, connection data defaults) is left out of the tree.

use crate::error::SchemaError;
use crate::schema::knxnet::{
    CEMI_PROP_READ_REQ, SERVICE_CONFIGURATION_REQUEST, SERVICE_CONNECTIONSTATE_REQUEST,
    SERVICE_CONNECT_REQUEST, SERVICE_DISCONNECT_REQUEST, SERVICE_SEARCH_REQUEST,
    SERVICE_TUNNELING_ACK, SERVICE_TUNNELING_REQUEST, TUNNEL_CONNECTION,
};
use crate::schema::Schema;
use crate::value::{Frame, Value};

/// IPv4 address and UDP port of a KNXnet/IP endpoint.
pub type Endpoint = ([u8; 4], u16);

/// HPAI structure for an IPv4/UDP endpoint.
pub fn hpai(endpoint: Endpoint) -> Frame<'static> {
    let (ip, port) = endpoint;
    Frame::new()
        .with("ip address", Value::owned_bytes(ip.to_vec()))
        .with("port", Value::Uint(u64::from(port)))
}

fn header(service: u64) -> Frame<'static> {
    Frame::new().with("service identifier", Value::Uint(service))
}

fn with_body(service: u64, body: Frame<'_>) -> Frame<'_> {
    Frame::new()
        .with("header", Value::Block(header(service)))
        .with("body", Value::Block(body))
}

fn connection_header(channel: u8, sequence: u8) -> Frame<'static> {
    Frame::new()
        .with("communication channel id", Value::Uint(u64::from(channel)))
        .with("sequence counter", Value::Uint(u64::from(sequence)))
}

/// SEARCH_REQUEST carrying the discovery endpoint to respond to.
pub fn search_request(discovery: Endpoint) -> Frame<'static> {
    with_body(
        SERVICE_SEARCH_REQUEST,
        Frame::new().with("discovery endpoint", Value::Block(hpai(discovery))),
    )
}

/// CONNECT_REQUEST for a tunneling connection on the link layer.
pub fn connect_request(control: Endpoint, data: Endpoint) -> Frame<'static> {
    // Connection data left empty: the schema defaults fill in the KNX
    // link layer and the reserved byte.
    let cri = Frame::new()
        .with("connection type code", Value::Uint(TUNNEL_CONNECTION))
        .with("connection data", Value::Block(Frame::new()));
    with_body(
        SERVICE_CONNECT_REQUEST,
        Frame::new()
            .with("control endpoint", Value::Block(hpai(control)))
            .with("data endpoint", Value::Block(hpai(data)))
            .with("connection request information", Value::Block(cri)),
    )
}

/// CONNECTIONSTATE_REQUEST (connection heartbeat).
pub fn connectionstate_request(channel: u8, control: Endpoint) -> Frame<'static> {
    with_body(
        SERVICE_CONNECTIONSTATE_REQUEST,
        Frame::new()
            .with("communication channel id", Value::Uint(u64::from(channel)))
            .with("control endpoint", Value::Block(hpai(control))),
    )
}

/// DISCONNECT_REQUEST closing a channel.
pub fn disconnect_request(channel: u8, control: Endpoint) -> Frame<'static> {
    with_body(
        SERVICE_DISCONNECT_REQUEST,
        Frame::new()
            .with("communication channel id", Value::Uint(u64::from(channel)))
            .with("control endpoint", Value::Block(hpai(control))),
    )
}

/// TUNNELING_REQUEST wrapping a cEMI frame (see [`l_data`]).
pub fn tunneling_request<'a>(channel: u8, sequence: u8, cemi: Frame<'a>) -> Frame<'a> {
    with_body(
        SERVICE_TUNNELING_REQUEST,
        Frame::new()
            .with("connection header", Value::Block(connection_header(channel, sequence)))
            .with("cemi", Value::Block(cemi)),
    )
}

/// TUNNELING_ACK confirming a received tunneling request.
pub fn tunneling_ack(channel: u8, sequence: u8, status: u8) -> Frame<'static> {
    with_body(
        SERVICE_TUNNELING_ACK,
        Frame::new()
            .with("communication channel id", Value::Uint(u64::from(channel)))
            .with("sequence counter", Value::Uint(u64::from(sequence)))
            .with("status", Value::Uint(u64::from(status))),
    )
}

/// Link-layer cEMI frame (L_Data.*) with the usual control-field settings:
/// standard frame, group addressing, low priority, hop count 6.
pub fn l_data(message_code: u64, source: u16, destination: u16, npdu: &[u8]) -> Frame<'_> {
    let data = Frame::new()
        .with("frame type", Value::Uint(1))
        .with("repeat", Value::Uint(1))
        .with("system broadcast", Value::Uint(1))
        .with("priority", Value::Uint(3))
        .with("address type", Value::Uint(1))
        .with("hop count", Value::Uint(6))
        .with("source address", Value::Uint(u64::from(source)))
        .with("destination address", Value::Uint(u64::from(destination)))
        .with("npdu", Value::bytes(npdu));
    Frame::new()
        .with("message code", Value::Uint(message_code))
        .with("cemi data", Value::Block(data))
}

/// CONFIGURATION_REQUEST reading a device property by name
/// (M_PropRead.req on instance 1, one element from index 1).
pub fn prop_read_request(
    schema: &Schema,
    channel: u8,
    sequence: u8,
    object_type: &str,
    property: &str,
) -> Result<Frame<'static>, SchemaError> {
    let object = schema.lookup_object_type(object_type)?;
    let property = schema.lookup_property(object_type, property)?;
    let data = Frame::new()
        .with("object type", Value::Uint(u64::from(object)))
        .with("object instance", Value::Uint(1))
        .with("property id", Value::Uint(u64::from(property)))
        .with("number of elements", Value::Uint(1))
        .with("start index", Value::Uint(1));
    let cemi = Frame::new()
        .with("message code", Value::Uint(CEMI_PROP_READ_REQ))
        .with("cemi data", Value::Block(data));
    Ok(with_body(
        SERVICE_CONFIGURATION_REQUEST,
        Frame::new()
            .with("connection header", Value::Block(connection_header(channel, sequence)))
            .with("cemi", Value::Block(cemi)),
    ))
}
