/// A request the benchmarks dispatch, grouped by how deep the route table has to be searched.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    path: &'static str,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, path: &'static str) -> Self {
        Self { name, group, path }
    }

    pub fn first(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::First, path)
    }

    pub fn last(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::Last, path)
    }

    pub fn miss(name: &'static str, path: &'static str) -> Self {
        Self::new(name, TestGroup::Miss, path)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestGroup {
    /// matched by the first route
    First,
    /// matched by the last route
    Last,
    /// matched by no route
    Miss,
}
