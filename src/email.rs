//! Outbound email composed in the "send for payment" form. Opaque to the
//! pipelines; only the fact that it was sent matters.

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMessage {
    #[n(0)]
    pub recipient: String,
    #[n(1)]
    pub subject: String,
    #[n(2)]
    pub body: String,
    #[n(3)]
    pub attachments: Vec<String>, // file names
}

impl EmailMessage {
    pub fn new(recipient: &str, subject: &str) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            ..Self::default()
        }
    }
    pub fn set_body(mut self, body: &str) -> Self {
        self.body = body.into();
        self
    }
    pub fn attach(mut self, file: &str) -> Self {
        self.attachments.push(file.into());
        self
    }

    pub fn build(&self) -> anyhow::Result<(String, Vec<u8>)> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}
