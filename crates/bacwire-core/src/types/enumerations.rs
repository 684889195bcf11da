numbered_enum! {
    /// Segmentation capability advertised in I-Am.
    pub enum Segmentation(u32, to_u32, from_u32) {
        SegmentedBoth = 0,
        SegmentedTransmit = 1,
        SegmentedReceive = 2,
        NoSegmentation = 3,
    }
}

numbered_enum! {
    /// Max-APDU code from the 4-bit field of a confirmed request.
    pub enum MaxApdu(u32, to_u32, from_u32) {
        UpTo50 = 0,
        UpTo128 = 1,
        UpTo206 = 2,
        UpTo480 = 3,
        UpTo1024 = 4,
        UpTo1476 = 5,
    }
}

impl MaxApdu {
    pub const fn octets(self) -> u16 {
        match self {
            Self::UpTo50 => 50,
            Self::UpTo128 => 128,
            Self::UpTo206 => 206,
            Self::UpTo480 => 480,
            Self::UpTo1024 => 1024,
            Self::UpTo1476 => 1476,
        }
    }
}

numbered_enum! {
    pub enum ErrorClass(u32, to_u32, from_u32) {
        Device = 0,
        Object = 1,
        Property = 2,
        Resources = 3,
        Security = 4,
        Services = 5,
        Vt = 6,
        Communication = 7,
    }
}

numbered_enum! {
    /// Error codes the service decoders name. Others stay numeric in
    /// [`crate::services::ErrorDetail`].
    pub enum ErrorCode(u32, to_u32, from_u32) {
        Other = 0,
        ConfigurationInProgress = 2,
        DeviceBusy = 3,
        InconsistentParameters = 7,
        InvalidDataType = 9,
        MissingRequiredParameter = 16,
        NoSpaceForObject = 18,
        ObjectDeletionNotPermitted = 23,
        PasswordFailure = 26,
        ServiceRequestDenied = 29,
        UnknownObject = 31,
        UnknownProperty = 32,
        ValueOutOfRange = 37,
        WriteAccessDenied = 40,
        InvalidArrayIndex = 42,
        CovSubscriptionFailed = 43,
    }
}
