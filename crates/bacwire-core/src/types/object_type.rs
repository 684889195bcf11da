numbered_enum! {
    /// Object type carried in the upper 10 bits of an object identifier.
    /// Numbers without a name here, vendor types included, are kept in
    /// `Proprietary`.
    pub enum ObjectType(u16, to_u16, from_u16) {
        AnalogInput = 0,
        AnalogOutput = 1,
        AnalogValue = 2,
        BinaryInput = 3,
        BinaryOutput = 4,
        BinaryValue = 5,
        Calendar = 6,
        Command = 7,
        Device = 8,
        EventEnrollment = 9,
        File = 10,
        Group = 11,
        Loop = 12,
        MultiStateInput = 13,
        MultiStateOutput = 14,
        NotificationClass = 15,
        Program = 16,
        Schedule = 17,
        Averaging = 18,
        MultiStateValue = 19,
        TrendLog = 20,
        LifeSafetyPoint = 21,
        LifeSafetyZone = 22,
        Accumulator = 23,
        PulseConverter = 24,
        EventLog = 25,
        GlobalGroup = 26,
        TrendLogMultiple = 27,
        LoadControl = 28,
        StructuredView = 29,
        AccessDoor = 30,
        AccessPoint = 33,
        NetworkPort = 56,
    } else Proprietary
}

impl ObjectType {
    /// First object type number reserved for vendor-defined types.
    pub const FIRST_PROPRIETARY: u16 = 128;

    pub const fn is_proprietary(self) -> bool {
        self.to_u16() >= Self::FIRST_PROPRIETARY
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectType;

    #[test]
    fn unknown_numbers_survive_conversion() {
        assert_eq!(ObjectType::from_u16(8), ObjectType::Device);
        assert_eq!(ObjectType::from_u16(700).to_u16(), 700);
        assert!(ObjectType::from_u16(700).is_proprietary());
        assert!(!ObjectType::from_u16(31).is_proprietary());
        assert_eq!(ObjectType::from_u16(31), ObjectType::Proprietary(31));
    }
}
