use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// Request or response metadata. Keys are lowercase header names.
pub type Metadata = BTreeMap<String, String>;

/// Typed descriptor of a unary RPC method.
pub struct Method<Req, Resp> {
    pub service: &'static str,
    pub name: &'static str,
    _marker: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> Method<Req, Resp> {
    pub const fn new(service: &'static str, name: &'static str) -> Self {
        Self {
            service,
            name,
            _marker: PhantomData,
        }
    }

    /// Request path, e.g. `/omogenjudge.problems.ProblemService/GetProblem`.
    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.name)
    }
}

impl<Req, Resp> Clone for Method<Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for Method<Req, Resp> {}

impl<Req, Resp> fmt::Debug for Method<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
