use bytes::BytesMut;
use micro_fcgi::codec::pairs::encode_pair;
use micro_fcgi::codec::{OutRecord, RecordEncoder};
use micro_fcgi::protocol::{EndRequestBody, ProtocolStatus, RecordType, MAX_WRITE};
use tokio_util::codec::Encoder;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, file }
    }

    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Small, file)
    }

    pub fn large(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Large, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A fixture file, either a response body or `NAME=value` params, one per line.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    /// The content as the application would send it: stdout records, the
    /// empty stdout record and a successful `EndRequest`.
    pub fn stdout_records(&self, request_id: u16) -> BytesMut {
        let mut encoder = RecordEncoder::new();
        let mut bytes = BytesMut::new();

        for chunk in self.content.as_bytes().chunks(MAX_WRITE) {
            encoder.encode(OutRecord::new(RecordType::Stdout, request_id, chunk), &mut bytes).expect("chunk fits in one record");
        }
        encoder.encode(OutRecord::new(RecordType::Stdout, request_id, &b""[..]), &mut bytes).expect("empty record is valid");

        let end = EndRequestBody::new(0, ProtocolStatus::RequestComplete).encode();
        encoder.encode(OutRecord::new(RecordType::EndRequest, request_id, &end[..]), &mut bytes).expect("end request is valid");
        bytes
    }

    /// The `NAME=value` lines of the content as name-value pairs.
    pub fn params(&self) -> Vec<(&'static str, &'static str)> {
        self.content.lines().filter_map(|line| line.split_once('=')).collect()
    }

    /// The params encoded as the content of a `Params` stream.
    pub fn encoded_params(&self) -> BytesMut {
        let mut bytes = BytesMut::new();
        for (name, value) in self.params() {
            encode_pair(&mut bytes, name, value).expect("fixture pair should be encodable");
        }
        bytes
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}
