use crate::{
  Edit,
  Tag,
  Unit,
  cleanup::cleanup_merge,
};

/// Diff two sequences without any cursor or surrogate correction.
pub(crate) fn diff_main<T: Unit>(old: &[T], new: &[T]) -> Vec<Edit<T>> {
  if old == new {
    if old.is_empty() {
      return Vec::new();
    }
    return vec![Edit::new(Tag::Equal, old.to_vec())];
  }

  let prefix = common_prefix(old, new);
  let (head, old, new) = (&old[..prefix], &old[prefix..], &new[prefix..]);
  let suffix = common_suffix(old, new);
  let tail = &old[old.len() - suffix..];
  let (old, new) = (&old[..old.len() - suffix], &new[..new.len() - suffix]);

  let mut edits = Vec::new();
  if !head.is_empty() {
    edits.push(Edit::new(Tag::Equal, head.to_vec()));
  }
  edits.extend(compute(old, new));
  if !tail.is_empty() {
    edits.push(Edit::new(Tag::Equal, tail.to_vec()));
  }

  cleanup_merge(&mut edits);
  edits
}

/// Diff two sequences that share no common prefix or suffix.
fn compute<T: Unit>(old: &[T], new: &[T]) -> Vec<Edit<T>> {
  if old.is_empty() {
    return vec![Edit::new(Tag::Insert, new.to_vec())];
  }
  if new.is_empty() {
    return vec![Edit::new(Tag::Delete, old.to_vec())];
  }

  let old_is_longer = old.len() > new.len();
  let (long, short) = if old_is_longer { (old, new) } else { (new, old) };

  if let Some(i) = find(long, short, 0) {
    // The shorter text sits inside the longer one.
    let outer = if old_is_longer { Tag::Delete } else { Tag::Insert };
    let mut edits = Vec::with_capacity(3);
    push_nonempty(&mut edits, outer, &long[..i]);
    push_nonempty(&mut edits, Tag::Equal, short);
    push_nonempty(&mut edits, outer, &long[i + short.len()..]);
    return edits;
  }

  if short.len() == 1 {
    // A single unit that is not contained cannot be an equality.
    return vec![
      Edit::new(Tag::Delete, old.to_vec()),
      Edit::new(Tag::Insert, new.to_vec()),
    ];
  }

  if let Some(hm) = half_match(old, new) {
    let mut edits = diff_main(hm.old_a, hm.new_a);
    edits.push(Edit::new(Tag::Equal, hm.common));
    edits.extend(diff_main(hm.old_b, hm.new_b));
    return edits;
  }

  bisect(old, new)
}

fn push_nonempty<T: Unit>(edits: &mut Vec<Edit<T>>, tag: Tag, text: &[T]) {
  if !text.is_empty() {
    edits.push(Edit::new(tag, text.to_vec()));
  }
}

/// Both texts split around a shared middle.
struct HalfMatch<'a, T> {
  old_a:  &'a [T],
  old_b:  &'a [T],
  new_a:  &'a [T],
  new_b:  &'a [T],
  common: Vec<T>,
}

/// Split of the longer and shorter text around a candidate common middle.
struct Candidate<'a, T> {
  long_a:  &'a [T],
  long_b:  &'a [T],
  short_a: &'a [T],
  short_b: &'a [T],
  common:  Vec<T>,
}

/// Look for a substring shared by both texts that is at least half as long as
/// the longer text.
///
/// This trades minimality for speed: the result may not be the smallest diff.
fn half_match<'a, T: Unit>(old: &'a [T], new: &'a [T]) -> Option<HalfMatch<'a, T>> {
  let old_is_longer = old.len() > new.len();
  let (long, short) = if old_is_longer { (old, new) } else { (new, old) };
  if long.len() < 4 || short.len() * 2 < long.len() {
    return None;
  }

  // Seed with a quarter of the longer text at the 1/4 and 1/2 marks.
  let first = half_match_at(long, short, long.len().div_ceil(4));
  let second = half_match_at(long, short, long.len().div_ceil(2));
  let best = match (first, second) {
    (None, None) => return None,
    (Some(hm), None) | (None, Some(hm)) => hm,
    (Some(first), Some(second)) => {
      if first.common.len() > second.common.len() {
        first
      } else {
        second
      }
    },
  };

  Some(if old_is_longer {
    HalfMatch {
      old_a:  best.long_a,
      old_b:  best.long_b,
      new_a:  best.short_a,
      new_b:  best.short_b,
      common: best.common,
    }
  } else {
    HalfMatch {
      old_a:  best.short_a,
      old_b:  best.short_b,
      new_a:  best.long_a,
      new_b:  best.long_b,
      common: best.common,
    }
  })
}

fn half_match_at<'a, T: Unit>(
  long: &'a [T],
  short: &'a [T],
  i: usize,
) -> Option<Candidate<'a, T>> {
  let seed = &long[i..i + long.len() / 4];
  let mut best: Option<Candidate<'a, T>> = None;
  let mut best_len = 0;

  let mut from = 0;
  while let Some(j) = find(short, seed, from) {
    let prefix = common_prefix(&long[i..], &short[j..]);
    let suffix = common_suffix(&long[..i], &short[..j]);
    if best_len < prefix + suffix {
      best_len = prefix + suffix;
      best = Some(Candidate {
        long_a:  &long[..i - suffix],
        long_b:  &long[i + prefix..],
        short_a: &short[..j - suffix],
        short_b: &short[j + prefix..],
        common:  short[j - suffix..j + prefix].to_vec(),
      });
    }
    from = j + 1;
  }

  best.filter(|candidate| candidate.common.len() * 2 >= long.len())
}

/// Find the middle snake of the edit graph and recurse on both halves.
///
/// Forward and reverse paths are extended simultaneously, one diagonal `k` at
/// a time. `v1[k]`/`v2[k]` hold the furthest x reached on diagonal `k` by the
/// forward and reverse paths. Terminates after at most `ceil((n + m) / 2)`
/// rounds.
fn bisect<T: Unit>(old: &[T], new: &[T]) -> Vec<Edit<T>> {
  let old_len = old.len() as isize;
  let new_len = new.len() as isize;
  let max_d = (old_len + new_len + 1) / 2;
  let v_offset = max_d;
  let v_len = 2 * max_d as usize;
  let mut v1 = vec![-1isize; v_len];
  let mut v2 = vec![-1isize; v_len];
  v1[v_offset as usize + 1] = 0;
  v2[v_offset as usize + 1] = 0;

  let delta = old_len - new_len;
  // With an odd delta the forward path detects the overlap, otherwise the
  // reverse path does.
  let front = delta % 2 != 0;

  let (mut k1_start, mut k1_end) = (0isize, 0isize);
  let (mut k2_start, mut k2_end) = (0isize, 0isize);

  for d in 0..max_d {
    let mut k1 = -d + k1_start;
    while k1 <= d - k1_end {
      let k1_offset = (v_offset + k1) as usize;
      let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
        v1[k1_offset + 1]
      } else {
        v1[k1_offset - 1] + 1
      };
      let mut y1 = x1 - k1;
      while x1 >= 0
        && x1 < old_len
        && y1 >= 0
        && y1 < new_len
        && old[x1 as usize] == new[y1 as usize]
      {
        x1 += 1;
        y1 += 1;
      }
      v1[k1_offset] = x1;
      if x1 > old_len {
        // Ran off the right of the graph.
        k1_end += 2;
      } else if y1 > new_len {
        // Ran off the bottom of the graph.
        k1_start += 2;
      } else if front {
        let k2_offset = v_offset + delta - k1;
        if k2_offset >= 0 && (k2_offset as usize) < v_len && v2[k2_offset as usize] != -1 {
          let x2 = old_len - v2[k2_offset as usize];
          if x1 >= x2 {
            return bisect_split(old, new, x1 as usize, y1 as usize);
          }
        }
      }
      k1 += 2;
    }

    let mut k2 = -d + k2_start;
    while k2 <= d - k2_end {
      let k2_offset = (v_offset + k2) as usize;
      let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
        v2[k2_offset + 1]
      } else {
        v2[k2_offset - 1] + 1
      };
      let mut y2 = x2 - k2;
      while x2 >= 0
        && x2 < old_len
        && y2 >= 0
        && y2 < new_len
        && old[(old_len - x2 - 1) as usize] == new[(new_len - y2 - 1) as usize]
      {
        x2 += 1;
        y2 += 1;
      }
      v2[k2_offset] = x2;
      if x2 > old_len {
        k2_end += 2;
      } else if y2 > new_len {
        k2_start += 2;
      } else if !front {
        let k1_offset = v_offset + delta - k2;
        if k1_offset >= 0 && (k1_offset as usize) < v_len && v1[k1_offset as usize] != -1 {
          let x1 = v1[k1_offset as usize];
          let y1 = v_offset + x1 - k1_offset;
          if x1 >= old_len - x2 {
            return bisect_split(old, new, x1 as usize, y1 as usize);
          }
        }
      }
      k2 += 2;
    }
  }

  // No overlap means nothing in common at all.
  vec![
    Edit::new(Tag::Delete, old.to_vec()),
    Edit::new(Tag::Insert, new.to_vec()),
  ]
}

fn bisect_split<T: Unit>(old: &[T], new: &[T], x: usize, y: usize) -> Vec<Edit<T>> {
  let mut edits = diff_main(&old[..x], &new[..y]);
  edits.extend(diff_main(&old[x..], &new[y..]));
  edits
}

pub(crate) fn common_prefix<T: Unit>(a: &[T], b: &[T]) -> usize {
  a.iter().zip(b).take_while(|(a, b)| a == b).count()
}

pub(crate) fn common_suffix<T: Unit>(a: &[T], b: &[T]) -> usize {
  a.iter()
    .rev()
    .zip(b.iter().rev())
    .take_while(|(a, b)| a == b)
    .count()
}

/// Position of the first occurrence of `needle` in `haystack` at or after
/// `from`.
pub(crate) fn find<T: Unit>(haystack: &[T], needle: &[T], from: usize) -> Option<usize> {
  if needle.is_empty() {
    return (from <= haystack.len()).then_some(from);
  }
  if from >= haystack.len() {
    return None;
  }
  haystack[from..]
    .windows(needle.len())
    .position(|window| window == needle)
    .map(|i| i + from)
}
