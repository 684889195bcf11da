numbered_enum! {
    /// The 4-bit PDU type that opens every APDU.
    pub enum ApduType(u8, to_u8, from_u8) {
        ConfirmedRequest = 0,
        UnconfirmedRequest = 1,
        SimpleAck = 2,
        ComplexAck = 3,
        SegmentAck = 4,
        Error = 5,
        Reject = 6,
        Abort = 7,
    }
}
