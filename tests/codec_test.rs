//! Integration tests: whole-datagram decode/encode against reference byte
//! layouts for the KNXnet/IP core services.

use knx_codec::{
    decode, decode_block, encode_frame, knxnet_schema, messages, Frame, Value,
};

/// SEARCH_RESPONSE: control endpoint HPAI, 54-byte device info DIB and a
/// supported-families DIB with three entries.
const SEARCH_RESPONSE: &[u8] = &[
    0x06, 0x10, 0x02, 0x02, 0x00, 0x4C, // header
    0x08, 0x01, 0xC0, 0xA8, 0x01, 0x0A, 0x0E, 0x57, // control endpoint
    0x36, 0x01, 0x02, 0x00, // DIB device info
    0x11, 0x0A, // knx individual address 1.1.10
    0x00, 0x01, // project installation identifier
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, // serial number
    0xE0, 0x00, 0x17, 0x0C, // multicast address 224.0.23.12
    0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // mac address
    b'K', b'N', b'X', b' ', b'I', b'P', b' ', b'R', b'o', b'u', b't', b'e', b'r', 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x08, 0x02, 0x02, 0x01, 0x03, 0x02, 0x04, 0x01, // supported service families
];

const CONNECT_RESPONSE: &[u8] = &[
    0x06, 0x10, 0x02, 0x06, 0x00, 0x14, // header
    0x15, 0x00, // channel 0x15, status OK
    0x08, 0x01, 0xC0, 0xA8, 0x01, 0x01, 0x0E, 0x57, // data endpoint
    0x04, 0x04, 0x11, 0x0A, // CRD: tunneling, individual address 1.1.10
];

/// CONFIGURATION_REQUEST carrying M_PropRead.con for PID_MANUFACTURER_ID.
const PROP_READ_CON: &[u8] = &[
    0x06, 0x10, 0x03, 0x10, 0x00, 0x13, // header
    0x04, 0x01, 0x01, 0x00, // connection header
    0xFB, 0x00, 0x00, 0x01, 0x0C, 0x10, 0x01, // M_PropRead.con on DEVICE
    0x00, 0xC5, // property data: manufacturer id
];

const TUNNELING_REQUEST: &[u8] = &[
    0x06, 0x10, 0x04, 0x20, 0x00, 0x15, // header
    0x04, 0x01, 0x15, 0x00, // connection header
    0x11, 0x00, 0xBC, 0xE0, 0x11, 0xFA, 0x0A, 0x03, 0x02, 0x00, 0x81, // L_Data.req
];

#[test]
fn test_search_response_decode() {
    let schema = knxnet_schema().unwrap();
    let (frame, consumed) = decode(&schema, SEARCH_RESPONSE).unwrap();
    assert_eq!(consumed, SEARCH_RESPONSE.len());

    let body = frame.frame("body").unwrap();
    let endpoint = body.frame("control endpoint").unwrap();
    assert_eq!(endpoint.bytes("ip address"), Some(&[192, 168, 1, 10][..]));
    assert_eq!(endpoint.uint("port"), Some(3671));

    let device = body.frame("device hardware").unwrap();
    assert_eq!(device.uint("knx medium"), Some(0x02));
    assert_eq!(device.uint("knx individual address"), Some(0x110A));
    assert_eq!(
        device.bytes("multicast address"),
        Some(&[224, 0, 23, 12][..])
    );
    assert_eq!(device.bytes("friendly name").map(<[u8]>::len), Some(30));

    let families = body
        .frame("supported service families")
        .unwrap()
        .list("service family")
        .unwrap();
    assert_eq!(families.len(), 3);
    assert_eq!(families[1].uint("service family id"), Some(0x03));
    assert_eq!(families[1].uint("service family version"), Some(0x02));
}

#[test]
fn test_decoded_frames_reencode_byte_identical() {
    let schema = knxnet_schema().unwrap();
    for vector in [
        SEARCH_RESPONSE,
        CONNECT_RESPONSE,
        PROP_READ_CON,
        TUNNELING_REQUEST,
    ] {
        let (frame, consumed) = decode(&schema, vector).unwrap();
        assert_eq!(consumed, vector.len());
        let out = encode_frame(&schema, &frame).unwrap();
        assert_eq!(&out[..], vector);
    }
}

#[test]
fn test_connect_response_crd_dispatch() {
    let schema = knxnet_schema().unwrap();
    let (frame, _) = decode(&schema, CONNECT_RESPONSE).unwrap();
    let body = frame.frame("body").unwrap();
    assert_eq!(body.uint("communication channel id"), Some(0x15));
    assert_eq!(body.uint("status"), Some(0));

    let crd = body.frame("connection response data block").unwrap();
    assert_eq!(crd.uint("connection type code"), Some(0x04));
    let data = crd.frame("connection data").unwrap();
    assert_eq!(data.uint("knx individual address"), Some(0x110A));
}

#[test]
fn test_tunneling_request_control_field_unpacking() {
    let schema = knxnet_schema().unwrap();
    let (frame, _) = decode(&schema, TUNNELING_REQUEST).unwrap();
    let cemi = frame.frame("body").unwrap().frame("cemi").unwrap();
    assert_eq!(cemi.uint("message code"), Some(0x11));

    let data = cemi.frame("cemi data").unwrap();
    assert_eq!(data.uint("frame type"), Some(1));
    assert_eq!(data.uint("repeat"), Some(1));
    assert_eq!(data.uint("priority"), Some(3));
    assert_eq!(data.uint("acknowledge request"), Some(0));
    assert_eq!(data.uint("address type"), Some(1));
    assert_eq!(data.uint("hop count"), Some(6));
    assert_eq!(data.uint("source address"), Some(0x11FA));
    assert_eq!(data.uint("destination address"), Some(0x0A03));
    assert_eq!(data.bytes("npdu"), Some(&[0x00, 0x81][..]));
}

#[test]
fn test_prop_read_con_property_access_fields() {
    let schema = knxnet_schema().unwrap();
    let (frame, _) = decode(&schema, PROP_READ_CON).unwrap();
    let cemi = frame.frame("body").unwrap().frame("cemi").unwrap();
    assert_eq!(cemi.uint("message code"), Some(0xFB));

    let data = cemi.frame("cemi data").unwrap();
    assert_eq!(data.uint("object type"), Some(0));
    assert_eq!(data.uint("property id"), Some(12));
    assert_eq!(data.uint("number of elements"), Some(1));
    assert_eq!(data.uint("start index"), Some(1));
    assert_eq!(data.bytes("data"), Some(&[0x00, 0xC5][..]));
}

#[test]
fn test_builder_output_survives_decode() {
    let schema = knxnet_schema().unwrap();
    let request = messages::connect_request(([10, 0, 0, 2], 3671), ([10, 0, 0, 2], 3672));
    let bytes = encode_frame(&schema, &request).unwrap();
    assert_eq!(bytes.len(), 26);

    let (frame, consumed) = decode(&schema, &bytes).unwrap();
    assert_eq!(consumed, 26);
    let header = frame.frame("header").unwrap();
    assert_eq!(header.uint("service identifier"), Some(0x0205));
    assert_eq!(header.uint("total length"), Some(26));

    let cri = frame
        .frame("body")
        .unwrap()
        .frame("connection request information")
        .unwrap();
    assert_eq!(cri.uint("structure length"), Some(4));
    assert_eq!(cri.uint("connection type code"), Some(0x04));
    // Defaults filled by the encoder come back as decoded values.
    let data = cri.frame("connection data").unwrap();
    assert_eq!(data.uint("knx layer"), Some(0x02));
    assert_eq!(data.uint("reserved"), Some(0));
}

#[test]
fn test_unknown_service_is_rejected_whole() {
    let schema = knxnet_schema().unwrap();
    let mut bytes = CONNECT_RESPONSE.to_vec();
    bytes[2] = 0x09;
    bytes[3] = 0xFF;
    let err = decode(&schema, &bytes).unwrap_err();
    assert!(err.is_unknown_code());
}

#[test]
fn test_truncation_points_all_fail_cleanly() {
    let schema = knxnet_schema().unwrap();
    for cut in 1..TUNNELING_REQUEST.len() {
        let err = decode(&schema, &TUNNELING_REQUEST[..cut]).unwrap_err();
        assert!(
            err.is_buffer_underrun() || err.is_length_mismatch(),
            "cut at {cut} gave {err}"
        );
    }
}

#[test]
fn test_corrupt_structure_length_is_rejected() {
    let schema = knxnet_schema().unwrap();
    let mut bytes = CONNECT_RESPONSE.to_vec();
    // HPAI claims 7 bytes; its fixed layout needs 8.
    bytes[8] = 0x07;
    let err = decode(&schema, &bytes).unwrap_err();
    assert!(err.is_length_mismatch());
}

#[test]
fn test_sub_block_decode_entry_point() {
    let schema = knxnet_schema().unwrap();
    let (hpai, consumed) =
        decode_block(&schema, "HPAI", &[0x08, 0x01, 0x0A, 0x00, 0x00, 0x01, 0x0E, 0x57]).unwrap();
    assert_eq!(consumed, 8);
    assert_eq!(hpai.uint("host protocol code"), Some(0x01));
    assert_eq!(hpai.uint("port"), Some(3671));
}

#[test]
fn test_handcrafted_tree_encodes_search_response() {
    let schema = knxnet_schema().unwrap();
    let (reference, _) = decode(&schema, SEARCH_RESPONSE).unwrap();

    let mut families = Vec::new();
    for (id, version) in [(0x02u64, 0x01u64), (0x03, 0x02), (0x04, 0x01)] {
        families.push(
            Frame::new()
                .with("service family id", Value::Uint(id))
                .with("service family version", Value::Uint(version)),
        );
    }
    let device = Frame::new()
        .with("device status", Value::Uint(0))
        .with("knx individual address", Value::Uint(0x110A))
        .with("project installation identifier", Value::Uint(1))
        .with("serial number", Value::bytes(&[0, 1, 2, 3, 4, 5]))
        .with("multicast address", Value::bytes(&[224, 0, 23, 12]))
        .with("mac address", Value::bytes(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]))
        .with("friendly name", Value::bytes(reference
            .frame("body").unwrap()
            .frame("device hardware").unwrap()
            .bytes("friendly name").unwrap()));
    let body = Frame::new()
        .with("control endpoint", Value::Block(messages::hpai(([192, 168, 1, 10], 3671))))
        .with("device hardware", Value::Block(device))
        .with(
            "supported service families",
            Value::Block(Frame::new().with("service family", Value::List(families))),
        );
    let header = Frame::new().with("service identifier", Value::Uint(0x0202));
    let frame = Frame::new()
        .with("header", Value::Block(header))
        .with("body", Value::Block(body));

    let out = encode_frame(&schema, &frame).unwrap();
    assert_eq!(&out[..], SEARCH_RESPONSE);
}
