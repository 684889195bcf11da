numbered_enum! {
    /// Property identifiers the service codecs and tools name directly.
    pub enum PropertyId(u32, to_u32, from_u32) {
        Description = 28,
        MaxApduLengthAccepted = 62,
        ObjectIdentifier = 75,
        ObjectList = 76,
        ObjectName = 77,
        ObjectType = 79,
        PresentValue = 85,
        PriorityArray = 87,
        RelinquishDefault = 104,
        SegmentationSupported = 107,
        StatusFlags = 111,
        VendorIdentifier = 120,
        VendorName = 121,
    } else Proprietary
}
