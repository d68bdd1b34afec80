//! A persistent, reference-counted, backward-linked list of nodes. This is the
//! storage shared by tag paths and tag trees: extending a chain never copies
//! or mutates its existing nodes.

use std::rc::Rc;

#[derive(Debug)]
pub(crate) struct Chain<N>(Option<Rc<Link<N>>>);

#[derive(Debug)]
struct Link<N> {
  node: N,
  depth: usize,
  previous: Chain<N>,
}

// Not derived, as that would require `N: Clone`
impl<N> Clone for Chain<N> {
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<N: Copy> Chain<N> {
  pub fn empty() -> Self {
    Self(None)
  }

  pub fn push(&self, node: N) -> Self {
    Self(Some(Rc::new(Link {
      node,
      depth: self.depth() + 1,
      previous: self.clone(),
    })))
  }

  pub fn last(&self) -> Option<N> {
    self.0.as_ref().map(|link| link.node)
  }

  pub fn previous(&self) -> Self {
    match &self.0 {
      Some(link) => link.previous.clone(),
      None => Self::empty(),
    }
  }

  pub fn depth(&self) -> usize {
    self.0.as_ref().map(|link| link.depth).unwrap_or(0)
  }

  /// Returns the nodes in order from the root.
  ///
  pub fn nodes(&self) -> Vec<N> {
    let mut nodes = Vec::with_capacity(self.depth());

    let mut current = self.0.as_ref();
    while let Some(link) = current {
      nodes.push(link.node);
      current = link.previous.0.as_ref();
    }

    nodes.reverse();
    nodes
  }

  /// Returns the chain made of the first `n` nodes. This shares structure with
  /// the original chain.
  ///
  pub fn take(&self, n: usize) -> Self {
    let mut current = self.clone();
    while current.depth() > n {
      current = current.previous();
    }

    current
  }

  /// Returns the chain with the first `n` nodes removed. The remaining nodes
  /// are rebuilt onto a new root.
  ///
  pub fn drop(&self, n: usize) -> Self {
    self
      .nodes()
      .into_iter()
      .skip(n)
      .fold(Self::empty(), |chain, node| chain.push(node))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn chain(nodes: &[u32]) -> Chain<u32> {
    nodes.iter().fold(Chain::empty(), |c, n| c.push(*n))
  }

  #[test]
  fn push_shares_previous_test() {
    let base = chain(&[1, 2]);
    let a = base.push(3);
    let b = base.push(4);

    assert_eq!(a.nodes(), vec![1, 2, 3]);
    assert_eq!(b.nodes(), vec![1, 2, 4]);
    assert_eq!(base.depth(), 2);
    assert!(Rc::ptr_eq(
      a.previous().0.as_ref().unwrap(),
      b.previous().0.as_ref().unwrap()
    ));
  }

  #[test]
  fn take_and_drop_test() {
    let c = chain(&[1, 2, 3, 4]);

    assert_eq!(c.take(2).nodes(), vec![1, 2]);
    assert_eq!(c.take(9).nodes(), vec![1, 2, 3, 4]);
    assert_eq!(c.drop(1).nodes(), vec![2, 3, 4]);
    assert_eq!(c.drop(4).depth(), 0);
    assert_eq!(c.drop(1).depth(), 3);
  }
}
