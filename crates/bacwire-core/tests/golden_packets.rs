use bacwire_core::apdu::{Apdu, ComplexAck, ConfirmedRequest, ErrorPdu, UnconfirmedRequest};
use bacwire_core::encoding::tag::{Tag, TagValue};
use bacwire_core::services::{
    ConfirmedServiceRequest, DeleteObjectRequest, ErrorDetail, IAmRequest,
    PrivateTransferRequest, ReadPropertyAck, ReadPropertyRequest, ReinitializeDeviceRequest,
    ReinitializeState, ServiceAck, ServiceError, SubscribeCovRequest, UnconfirmedServiceRequest,
    VtCloseRequest, WhoIsRequest, WritePropertyRequest,
};
use bacwire_core::types::{ErrorClass, ErrorCode, ObjectId, ObjectType, PropertyId, Segmentation};
use bacwire_core::Npdu;

fn confirmed(invoke_id: u8, service: ConfirmedServiceRequest) -> Npdu {
    Npdu::application(Apdu::ConfirmedRequest(ConfirmedRequest::new(
        invoke_id, service,
    )))
}

fn unconfirmed(service: UnconfirmedServiceRequest) -> Npdu {
    Npdu::application(Apdu::UnconfirmedRequest(UnconfirmedRequest::new(service)))
}

/// Encodes `npdu`, compares with `expected`, and decodes `expected` back.
fn assert_frame(npdu: &Npdu, expected: &[u8]) {
    let bytes = npdu.to_bytes().unwrap();
    assert_eq!(bytes, expected);
    assert_eq!(npdu.bit_length(), 8 * expected.len() as u64);
    assert_eq!(&Npdu::from_bytes(expected).unwrap(), npdu);
}

#[test]
fn who_is_global_frame_matches_fixture() {
    assert_frame(
        &unconfirmed(UnconfirmedServiceRequest::WhoIs(WhoIsRequest::global())),
        &[0x01, 0x00, 0x10, 0x08],
    );
}

#[test]
fn who_is_range_frame_matches_fixture() {
    assert_frame(
        &unconfirmed(UnconfirmedServiceRequest::WhoIs(WhoIsRequest::range(
            0, 4_194_303,
        ))),
        &[0x01, 0x00, 0x10, 0x08, 0x09, 0x00, 0x1B, 0x3F, 0xFF, 0xFF],
    );
}

#[test]
fn i_am_frame_matches_fixture() {
    assert_frame(
        &unconfirmed(UnconfirmedServiceRequest::IAm(IAmRequest {
            object_type: ObjectType::Device,
            object_instance_number: 1,
            max_apdu_accepted: 1476,
            segmentation_supported: Segmentation::NoSegmentation,
            vendor_id: 15,
        })),
        &[
            0x01, 0x00, 0x10, 0x00, 0xC4, 0x02, 0x00, 0x00, 0x01, 0x22, 0x05, 0xC4, 0x91, 0x03,
            0x21, 0x0F,
        ],
    );
}

#[test]
fn read_property_frame_matches_fixture() {
    assert_frame(
        &confirmed(
            1,
            ConfirmedServiceRequest::ReadProperty(ReadPropertyRequest {
                object_id: ObjectId::new(ObjectType::Device, 123),
                property_id: PropertyId::ObjectName,
                array_index: None,
            }),
        ),
        &[
            0x01, 0x00, 0x00, 0x05, 0x01, 0x0C, 0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4D,
        ],
    );
}

#[test]
fn read_property_ack_frame_matches_fixture() {
    let ack = ServiceAck::ReadProperty(ReadPropertyAck {
        object_id: ObjectId::new(ObjectType::Device, 123),
        property_id: PropertyId::ObjectName,
        array_index: None,
        values: vec![Tag::application(TagValue::character_string("HVAC1")).unwrap()],
    });
    assert_frame(
        &Npdu::application(Apdu::ComplexAck(ComplexAck::new(1, ack))),
        &[
            0x01, 0x00, 0x30, 0x01, 0x0C, 0x0C, 0x02, 0x00, 0x00, 0x7B, 0x19, 0x4D, 0x3E, 0x75,
            0x06, 0x00, 0x48, 0x56, 0x41, 0x43, 0x31, 0x3F,
        ],
    );
}

#[test]
fn write_property_frame_matches_fixture() {
    let request = WritePropertyRequest {
        object_id: ObjectId::new(ObjectType::AnalogValue, 1),
        property_id: PropertyId::PresentValue,
        array_index: None,
        value: Tag::application(TagValue::Real(72.5)).unwrap(),
        priority: Some(Tag::context_unsigned(4, 8)),
    };
    let npdu = confirmed(2, ConfirmedServiceRequest::WriteProperty(request)).expecting_reply(true);
    assert_frame(
        &npdu,
        &[
            0x01, 0x04, 0x00, 0x05, 0x02, 0x0F, 0x0C, 0x00, 0x80, 0x00, 0x01, 0x19, 0x55, 0x3E,
            0x44, 0x42, 0x91, 0x00, 0x00, 0x3F, 0x49, 0x08,
        ],
    );
}

#[test]
fn subscribe_cov_frame_matches_fixture() {
    assert_frame(
        &confirmed(
            17,
            ConfirmedServiceRequest::SubscribeCov(SubscribeCovRequest {
                subscriber_process_id: 7,
                monitored_object_id: ObjectId::new(ObjectType::AnalogInput, 2),
                issue_confirmed_notifications: Some(false),
                lifetime_seconds: Some(600),
            }),
        ),
        &[
            0x01, 0x00, 0x00, 0x05, 0x11, 0x05, 0x09, 0x07, 0x1C, 0x00, 0x00, 0x00, 0x02, 0x29,
            0x00, 0x3A, 0x02, 0x58,
        ],
    );
}

#[test]
fn reinitialize_frame_matches_fixture() {
    assert_frame(
        &confirmed(
            9,
            ConfirmedServiceRequest::ReinitializeDevice(
                ReinitializeDeviceRequest::new(ReinitializeState::Warmstart, None).unwrap(),
            ),
        ),
        &[0x01, 0x00, 0x00, 0x05, 0x09, 0x14, 0x09, 0x01],
    );
}

#[test]
fn delete_object_frame_matches_fixture() {
    assert_frame(
        &confirmed(
            7,
            ConfirmedServiceRequest::DeleteObject(DeleteObjectRequest {
                object_id: ObjectId::new(ObjectType::AnalogValue, 42),
            }),
        ),
        &[0x01, 0x00, 0x00, 0x05, 0x07, 0x0B, 0xC4, 0x00, 0x80, 0x00, 0x2A],
    );
}

#[test]
fn vt_close_frame_matches_fixture() {
    assert_frame(
        &confirmed(3, ConfirmedServiceRequest::VtClose(VtCloseRequest::new(&[5, 6]))),
        &[0x01, 0x00, 0x00, 0x05, 0x03, 0x16, 0x21, 0x05, 0x21, 0x06],
    );
}

#[test]
fn private_transfer_frame_matches_fixture() {
    let request = PrivateTransferRequest {
        vendor_id: 260,
        service_number: 1,
        service_parameters: Some(vec![Tag::context_unsigned(0, 42)]),
    };
    assert_frame(
        &confirmed(4, ConfirmedServiceRequest::ConfirmedPrivateTransfer(request)),
        &[
            0x01, 0x00, 0x00, 0x05, 0x04, 0x12, 0x0A, 0x01, 0x04, 0x19, 0x01, 0x2E, 0x09, 0x2A,
            0x2F,
        ],
    );
}

#[test]
fn error_frame_matches_fixture() {
    let error = ServiceError::ReadProperty(ErrorDetail::new(
        ErrorClass::Property,
        ErrorCode::UnknownProperty,
    ));
    assert_frame(
        &Npdu::application(Apdu::Error(ErrorPdu {
            invoke_id: 1,
            error,
        })),
        &[0x01, 0x00, 0x50, 0x01, 0x0C, 0x91, 0x02, 0x91, 0x20],
    );
}
