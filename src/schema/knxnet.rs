//! KNXnet/IP core grammar.
//!
//! Declarative block definitions for the KNXnet/IP header, the core service
//! bodies (discovery, connection management, tunneling, device
//! configuration) and the embedded cEMI transport frame, plus the code
//! tables that drive variant dispatch.
//!
//! Every frame shares the 6-byte header:
//!
//! ```text
//!  0                   1                   2
//!  +---------------+---------------+---------------+---------------+
//!  | header length | proto version |      service identifier       |
//!  +---------------+---------------+---------------+---------------+
//!  |         total length          |  body ...
//!  +---------------+---------------+
//! ```
//!
//! The service identifier selects the body layout; inside configuration and
//! tunneling bodies the cEMI message code selects the payload layout again.

use crate::error::SchemaError;
use crate::schema::{FieldDef, Schema};

/// Name of the block a whole-datagram decode starts from.
pub const TOP_LEVEL_BLOCK: &str = "FRAME";

// =============================================================================
// Service Identifiers
// =============================================================================

pub const SERVICE_SEARCH_REQUEST: u64 = 0x0201;
pub const SERVICE_SEARCH_RESPONSE: u64 = 0x0202;
pub const SERVICE_DESCRIPTION_REQUEST: u64 = 0x0203;
pub const SERVICE_DESCRIPTION_RESPONSE: u64 = 0x0204;
pub const SERVICE_CONNECT_REQUEST: u64 = 0x0205;
pub const SERVICE_CONNECT_RESPONSE: u64 = 0x0206;
pub const SERVICE_CONNECTIONSTATE_REQUEST: u64 = 0x0207;
pub const SERVICE_CONNECTIONSTATE_RESPONSE: u64 = 0x0208;
pub const SERVICE_DISCONNECT_REQUEST: u64 = 0x0209;
pub const SERVICE_DISCONNECT_RESPONSE: u64 = 0x020A;
pub const SERVICE_CONFIGURATION_REQUEST: u64 = 0x0310;
pub const SERVICE_CONFIGURATION_ACK: u64 = 0x0311;
pub const SERVICE_TUNNELING_REQUEST: u64 = 0x0420;
pub const SERVICE_TUNNELING_ACK: u64 = 0x0421;

// =============================================================================
// Connection Types and cEMI Message Codes
// =============================================================================

/// Device management connection (no extra connection data).
pub const DEVICE_MGMT_CONNECTION: u64 = 0x03;
/// Tunneling connection (KNX layer + reserved byte).
pub const TUNNEL_CONNECTION: u64 = 0x04;

/// cEMI L_Data.req (link layer, host to bus).
pub const CEMI_L_DATA_REQ: u64 = 0x11;
/// cEMI L_Data.ind (link layer, bus to host).
pub const CEMI_L_DATA_IND: u64 = 0x29;
/// cEMI L_Data.con (link layer confirmation).
pub const CEMI_L_DATA_CON: u64 = 0x2E;
/// cEMI M_PropRead.req (device management property read).
pub const CEMI_PROP_READ_REQ: u64 = 0xFC;
/// cEMI M_PropRead.con (property read confirmation).
pub const CEMI_PROP_READ_CON: u64 = 0xFB;
/// cEMI M_PropWrite.req (property write).
pub const CEMI_PROP_WRITE_REQ: u64 = 0xF6;
/// cEMI M_PropWrite.con (property write confirmation).
pub const CEMI_PROP_WRITE_CON: u64 = 0xF5;
/// cEMI M_PropInfo.ind (unsolicited property info).
pub const CEMI_PROP_INFO_IND: u64 = 0xFD;

// =============================================================================
// Block Definitions
// =============================================================================

const FRAME: &[FieldDef] = &[
    FieldDef::block("header", "HEADER"),
    FieldDef::variant("body", "service identifier", "service identifier"),
];

const HEADER: &[FieldDef] = &[
    FieldDef::length("header length", 1),
    FieldDef::uint("protocol version", 1).with_default(0x10),
    FieldDef::uint("service identifier", 2),
    FieldDef::total_length("total length", 2),
];

/// Bodies and connection data with no payload at all.
const EMPTY: &[FieldDef] = &[];

/// Host Protocol Address Information: transport endpoint description.
const HPAI: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("host protocol code", 1).with_default(0x01),
    FieldDef::bytes("ip address", 4),
    FieldDef::uint("port", 2),
];

/// Device information DIB, fixed 54 bytes.
const DIB_DEVICE_INFO: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("description type code", 1).with_default(0x01),
    FieldDef::uint("knx medium", 1).with_default(0x02),
    FieldDef::uint("device status", 1),
    FieldDef::uint("knx individual address", 2),
    FieldDef::uint("project installation identifier", 2),
    FieldDef::bytes("serial number", 6),
    FieldDef::bytes("multicast address", 4),
    FieldDef::bytes("mac address", 6),
    FieldDef::bytes("friendly name", 30),
];

/// Supported service families DIB: repeated (id, version) pairs filling the
/// declared structure length.
const DIB_SUPP_SVC_FAMILIES: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("description type code", 1).with_default(0x02),
    FieldDef::block("service family", "SERVICE_FAMILY").repeated(),
];

const SERVICE_FAMILY: &[FieldDef] = &[
    FieldDef::uint("service family id", 1),
    FieldDef::uint("service family version", 1),
];

/// Connection Request Information: the connection type selects the trailing
/// connection data, which device management connections omit entirely.
const CRI: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("connection type code", 1),
    FieldDef::variant("connection data", "connection type code", "cri connection type code")
        .optional(),
];

const CRD: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("connection type code", 1),
    FieldDef::variant("connection data", "connection type code", "crd connection type code")
        .optional(),
];

const TUNNELING_CONNECTION: &[FieldDef] = &[
    FieldDef::uint("knx layer", 1).with_default(0x02),
    FieldDef::uint("reserved", 1).with_default(0),
];

const CRD_TUNNELING_CONNECTION: &[FieldDef] = &[FieldDef::uint("knx individual address", 2)];

/// 4-byte connection header carried by tunneling/configuration requests.
const CONNECTION_HEADER: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("sequence counter", 1),
    FieldDef::uint("reserved", 1).with_default(0),
];

// Service bodies.

const SEARCH_REQUEST: &[FieldDef] = &[FieldDef::block("discovery endpoint", "HPAI")];

const SEARCH_RESPONSE: &[FieldDef] = &[
    FieldDef::block("control endpoint", "HPAI"),
    FieldDef::block("device hardware", "DIB_DEVICE_INFO"),
    FieldDef::block("supported service families", "DIB_SUPP_SVC_FAMILIES"),
];

const DESCRIPTION_REQUEST: &[FieldDef] = &[FieldDef::block("control endpoint", "HPAI")];

const DESCRIPTION_RESPONSE: &[FieldDef] = &[
    FieldDef::block("device hardware", "DIB_DEVICE_INFO"),
    FieldDef::block("supported service families", "DIB_SUPP_SVC_FAMILIES"),
];

const CONNECT_REQUEST: &[FieldDef] = &[
    FieldDef::block("control endpoint", "HPAI"),
    FieldDef::block("data endpoint", "HPAI"),
    FieldDef::block("connection request information", "CRI"),
];

const CONNECT_RESPONSE: &[FieldDef] = &[
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("status", 1).with_default(0),
    FieldDef::block("data endpoint", "HPAI"),
    FieldDef::block("connection response data block", "CRD"),
];

const CONNECTIONSTATE_REQUEST: &[FieldDef] = &[
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("reserved", 1).with_default(0),
    FieldDef::block("control endpoint", "HPAI"),
];

const CONNECTIONSTATE_RESPONSE: &[FieldDef] = &[
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("status", 1).with_default(0),
];

const DISCONNECT_REQUEST: &[FieldDef] = &[
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("reserved", 1).with_default(0),
    FieldDef::block("control endpoint", "HPAI"),
];

const DISCONNECT_RESPONSE: &[FieldDef] = &[
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("status", 1).with_default(0),
];

const CONFIGURATION_REQUEST: &[FieldDef] = &[
    FieldDef::block("connection header", "CONNECTION_HEADER"),
    FieldDef::block("cemi", "CEMI"),
];

/// Acknowledgement bodies reuse the connection-header layout with the
/// reserved slot carrying a status code.
const CONFIGURATION_ACK: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("sequence counter", 1),
    FieldDef::uint("status", 1).with_default(0),
];

const TUNNELING_REQUEST: &[FieldDef] = &[
    FieldDef::block("connection header", "CONNECTION_HEADER"),
    FieldDef::block("cemi", "CEMI"),
];

const TUNNELING_ACK: &[FieldDef] = &[
    FieldDef::length("structure length", 1),
    FieldDef::uint("communication channel id", 1),
    FieldDef::uint("sequence counter", 1),
    FieldDef::uint("status", 1).with_default(0),
];

// cEMI.

const CEMI: &[FieldDef] = &[
    FieldDef::uint("message code", 1),
    FieldDef::variant("cemi data", "message code", "message code"),
];

/// Link-layer cEMI (L_Data.*): additional info run, two bit-packed control
/// fields, addresses, and a length-governed NPDU.
const L_CEMI: &[FieldDef] = &[
    FieldDef::uint("additional info length", 1),
    FieldDef::sized("additional information", "additional info length"),
    FieldDef::bits(
        "frame type,reserved,repeat,system broadcast,priority,acknowledge request,confirm",
        &[1, 1, 1, 1, 2, 1, 1],
    ),
    FieldDef::bits("address type,hop count,extended frame format", &[1, 3, 4]),
    FieldDef::uint("source address", 2),
    FieldDef::uint("destination address", 2),
    FieldDef::uint("npdu length", 1),
    FieldDef::sized("npdu", "npdu length"),
];

/// Device-management cEMI (M_Prop*): property access on interface objects.
const DP_CEMI: &[FieldDef] = &[
    FieldDef::uint("object type", 2),
    FieldDef::uint("object instance", 1),
    FieldDef::uint("property id", 1),
    FieldDef::bits("number of elements,start index", &[4, 12]),
    FieldDef::tail("data"),
];

const BLOCKS: &[(&str, &[FieldDef])] = &[
    ("FRAME", FRAME),
    ("HEADER", HEADER),
    ("EMPTY", EMPTY),
    ("HPAI", HPAI),
    ("DIB_DEVICE_INFO", DIB_DEVICE_INFO),
    ("DIB_SUPP_SVC_FAMILIES", DIB_SUPP_SVC_FAMILIES),
    ("SERVICE_FAMILY", SERVICE_FAMILY),
    ("CRI", CRI),
    ("CRD", CRD),
    ("TUNNELING_CONNECTION", TUNNELING_CONNECTION),
    ("CRD_TUNNELING_CONNECTION", CRD_TUNNELING_CONNECTION),
    ("CONNECTION_HEADER", CONNECTION_HEADER),
    ("SEARCH_REQUEST", SEARCH_REQUEST),
    ("SEARCH_RESPONSE", SEARCH_RESPONSE),
    ("DESCRIPTION_REQUEST", DESCRIPTION_REQUEST),
    ("DESCRIPTION_RESPONSE", DESCRIPTION_RESPONSE),
    ("CONNECT_REQUEST", CONNECT_REQUEST),
    ("CONNECT_RESPONSE", CONNECT_RESPONSE),
    ("CONNECTIONSTATE_REQUEST", CONNECTIONSTATE_REQUEST),
    ("CONNECTIONSTATE_RESPONSE", CONNECTIONSTATE_RESPONSE),
    ("DISCONNECT_REQUEST", DISCONNECT_REQUEST),
    ("DISCONNECT_RESPONSE", DISCONNECT_RESPONSE),
    ("CONFIGURATION_REQUEST", CONFIGURATION_REQUEST),
    ("CONFIGURATION_ACK", CONFIGURATION_ACK),
    ("TUNNELING_REQUEST", TUNNELING_REQUEST),
    ("TUNNELING_ACK", TUNNELING_ACK),
    ("CEMI", CEMI),
    ("L_CEMI", L_CEMI),
    ("DP_CEMI", DP_CEMI),
];

// =============================================================================
// Code Tables
// =============================================================================

const SERVICE_IDENTIFIER_TABLE: &[(u64, &str)] = &[
    (SERVICE_SEARCH_REQUEST, "SEARCH_REQUEST"),
    (SERVICE_SEARCH_RESPONSE, "SEARCH_RESPONSE"),
    (SERVICE_DESCRIPTION_REQUEST, "DESCRIPTION_REQUEST"),
    (SERVICE_DESCRIPTION_RESPONSE, "DESCRIPTION_RESPONSE"),
    (SERVICE_CONNECT_REQUEST, "CONNECT_REQUEST"),
    (SERVICE_CONNECT_RESPONSE, "CONNECT_RESPONSE"),
    (SERVICE_CONNECTIONSTATE_REQUEST, "CONNECTIONSTATE_REQUEST"),
    (SERVICE_CONNECTIONSTATE_RESPONSE, "CONNECTIONSTATE_RESPONSE"),
    (SERVICE_DISCONNECT_REQUEST, "DISCONNECT_REQUEST"),
    (SERVICE_DISCONNECT_RESPONSE, "DISCONNECT_RESPONSE"),
    (SERVICE_CONFIGURATION_REQUEST, "CONFIGURATION_REQUEST"),
    (SERVICE_CONFIGURATION_ACK, "CONFIGURATION_ACK"),
    (SERVICE_TUNNELING_REQUEST, "TUNNELING_REQUEST"),
    (SERVICE_TUNNELING_ACK, "TUNNELING_ACK"),
];

const MESSAGE_CODE_TABLE: &[(u64, &str)] = &[
    (CEMI_L_DATA_REQ, "L_CEMI"),
    (CEMI_L_DATA_IND, "L_CEMI"),
    (CEMI_L_DATA_CON, "L_CEMI"),
    (CEMI_PROP_READ_REQ, "DP_CEMI"),
    (CEMI_PROP_READ_CON, "DP_CEMI"),
    (CEMI_PROP_WRITE_REQ, "DP_CEMI"),
    (CEMI_PROP_WRITE_CON, "DP_CEMI"),
    (CEMI_PROP_INFO_IND, "DP_CEMI"),
];

const CRI_CONNECTION_TYPE_TABLE: &[(u64, &str)] = &[
    (DEVICE_MGMT_CONNECTION, "EMPTY"),
    (TUNNEL_CONNECTION, "TUNNELING_CONNECTION"),
];

const CRD_CONNECTION_TYPE_TABLE: &[(u64, &str)] = &[
    (DEVICE_MGMT_CONNECTION, "EMPTY"),
    (TUNNEL_CONNECTION, "CRD_TUNNELING_CONNECTION"),
];

const CODES: &[(&str, &[(u64, &str)])] = &[
    ("service identifier", SERVICE_IDENTIFIER_TABLE),
    ("message code", MESSAGE_CODE_TABLE),
    ("cri connection type code", CRI_CONNECTION_TYPE_TABLE),
    ("crd connection type code", CRD_CONNECTION_TYPE_TABLE),
];

// =============================================================================
// Interface Object Types and Properties
// =============================================================================

const OBJECT_TYPES: &[(&str, u16)] = &[("DEVICE", 0), ("IP_PARAMETER_OBJECTS", 11)];

const DEVICE_PROPERTIES: &[(&str, u16)] = &[("PID_MANUFACTURER_ID", 12)];

const IP_PARAMETER_PROPERTIES: &[(&str, u16)] = &[
    ("PID_PROJECT_INSTALLATION_ID", 51),
    ("PID_KNX_INDIVIDUAL_ADDRESS", 52),
    ("PID_ADDITIONAL_INDIVIDUAL_ADDRESSES", 53),
    ("PID_CURRENT_IP_ASSIGNMENT_METHOD", 54),
    ("PID_IP_ASSIGNMENT_METHOD", 55),
    ("PID_IP_CAPABILITIES", 56),
    ("PID_CURRENT_IP_ADDRESS", 57),
    ("PID_CURRENT_SUBNET_MASK", 58),
    ("PID_CURRENT_DEFAULT_GATEWAY", 59),
    ("PID_IP_ADDRESS", 60),
    ("PID_SUBNET_MASK", 61),
    ("PID_DEFAULT_GATEWAY", 62),
];

const PROPERTIES: &[(&str, &[(&str, u16)])] = &[
    ("DEVICE", DEVICE_PROPERTIES),
    ("IP_PARAMETER_OBJECTS", IP_PARAMETER_PROPERTIES),
];

/// Build the compiled KNXnet/IP core schema.
pub fn knxnet_schema() -> Result<Schema, SchemaError> {
    Schema::new(BLOCKS, CODES, OBJECT_TYPES, PROPERTIES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_compiles() {
        let schema = knxnet_schema().unwrap();
        assert_eq!(
            schema.lookup_code("service identifier", SERVICE_CONNECT_REQUEST).unwrap(),
            "CONNECT_REQUEST"
        );
        assert_eq!(
            schema.lookup_code("message code", CEMI_PROP_READ_REQ).unwrap(),
            "DP_CEMI"
        );
        assert_eq!(
            schema.lookup_code("cri connection type code", DEVICE_MGMT_CONNECTION).unwrap(),
            "EMPTY"
        );
    }

    #[test]
    fn test_unknown_service_identifier_rejected() {
        let schema = knxnet_schema().unwrap();
        assert!(schema
            .lookup_code("service identifier", 0x09FF)
            .unwrap_err()
            .is_unknown_code());
    }

    #[test]
    fn test_mandated_property_identifiers() {
        let schema = knxnet_schema().unwrap();
        assert_eq!(schema.lookup_object_type("DEVICE").unwrap(), 0);
        assert_eq!(schema.lookup_object_type("IP_PARAMETER_OBJECTS").unwrap(), 11);
        assert_eq!(schema.lookup_property("DEVICE", "PID_MANUFACTURER_ID").unwrap(), 12);
        assert_eq!(
            schema.lookup_property("IP_PARAMETER_OBJECTS", "PID_IP_ADDRESS").unwrap(),
            60
        );
    }
}
