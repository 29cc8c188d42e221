//! The zone tree: a label-keyed trie holding authoritative data for one or
//! more zones sharing a single namespace, per RFC 1034 §4.3.2.
//!
//! A [`ZoneNode`] is addressed by walking labels right-to-left (apex-ward
//! label first) from the tree's root. A node becomes a *zone apex* when
//! [`ZoneTree::add_zone`] marks it with a [`ZoneInfo`]; it becomes a
//! *delegation point* when it carries an `NS` [`RRSet`] and is not itself an
//! apex. Parent back-references are weak: a parent owns its children through
//! a strong `Rc`, so a node's subtree drops when the node is dropped.

use crate::errors::ZoneError;
use crate::name::{Label, Name};
use crate::rr::RRGen;
use crate::types::DNSType;
use std::collections::{BTreeMap, HashMap};
use std::convert::TryInto;
use std::path::Path;
use std::sync::{Arc, RwLock, Weak};
use std::str::FromStr;
use std::time::Duration;

pub type NodeRef = Arc<RwLock<ZoneNode>>;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// All records at one (owner, type) pair. RRSIGs ingested through
/// [`ZoneNode::insert`] land in `signatures`, keeping the covered type's own
/// `records` free of anything but that type's contents.
#[derive(Clone, Debug, Default)]
pub struct RRSet {
    pub ttl: Duration,
    pub records: Vec<RRGen>,
    pub signatures: Vec<RRGen>,
}

impl RRSet {
    fn new(ttl: Duration) -> RRSet {
        RRSet {
            ttl,
            records: Vec::new(),
            signatures: Vec::new(),
        }
    }
}

/// Marks a node as the apex of a loaded zone.
#[derive(Clone, Debug)]
pub struct ZoneInfo {
    pub origin: Name,
}

pub struct ZoneNode {
    /// `None` only for the tree's root (the namespace root, ".").
    label: Option<Label>,
    parent: Option<Weak<RwLock<ZoneNode>>>,
    children: BTreeMap<Label, NodeRef>,
    rrsets: HashMap<DNSType, RRSet>,
    pub zone: Option<ZoneInfo>,
}

impl ZoneNode {
    fn new(label: Option<Label>, parent: Option<Weak<RwLock<ZoneNode>>>) -> ZoneNode {
        ZoneNode {
            label,
            parent,
            children: BTreeMap::new(),
            rrsets: HashMap::new(),
            zone: None,
        }
    }

    pub fn is_apex(&self) -> bool {
        self.zone.is_some()
    }

    /// True iff this node carries an `NS` set and is not itself a zone apex.
    pub fn is_delegation(&self) -> bool {
        !self.is_apex() && self.rrsets.contains_key(&DNSType::NS)
    }

    pub fn rrset(&self, t: DNSType) -> Option<&RRSet> {
        self.rrsets.get(&t)
    }

    pub fn rrsets(&self) -> impl Iterator<Item = (&DNSType, &RRSet)> {
        self.rrsets.iter()
    }

    pub fn has_any_rrset(&self) -> bool {
        !self.rrsets.is_empty()
    }

    /// Reconstructs this node's absolute name by walking parent pointers to
    /// the tree root, collecting labels in leaf-to-root order — which is
    /// already the left-to-right presentation order [`Name`] expects.
    pub fn absolute_name(node: &NodeRef) -> Name {
        let mut labels = Vec::new();
        let mut current = Some(node.clone());
        while let Some(n) = current {
            let b = n.read().unwrap();
            if let Some(l) = &b.label {
                labels.push(l.clone());
            }
            current = b.parent.as_ref().and_then(|w| w.upgrade());
        }
        Name::from_labels(labels)
    }

    /// Inserts one record at this node, enforcing the CNAME-exclusivity
    /// invariant and routing RRSIGs into their covered type's signature
    /// list. Duplicate NS entries (same owner, same target) are silently
    /// deduplicated at ingest.
    pub fn insert(&mut self, rr: RRGen, ttl: Duration) -> Result<(), ZoneError> {
        if let RRGen::RRSIG(sig) = &rr {
            let covered = sig.covered_type;
            let set = self
                .rrsets
                .entry(covered)
                .or_insert_with(|| RRSet::new(ttl));
            set.signatures.push(rr);
            return Ok(());
        }

        let t = rr.r#type();

        if t == DNSType::CNAME {
            let conflicts = self
                .rrsets
                .keys()
                .any(|&k| k != DNSType::CNAME && k != DNSType::NSEC);
            if conflicts {
                return Err(ZoneError::CnameConflict);
            }
        } else if t != DNSType::NSEC && self.rrsets.contains_key(&DNSType::CNAME) {
            return Err(ZoneError::CnameSibling(t));
        }

        let set = self.rrsets.entry(t).or_insert_with(|| RRSet::new(ttl));

        if t == DNSType::NS {
            if let RRGen::NS(ns) = &rr {
                let dup = set.records.iter().any(|existing| {
                    matches!(existing, RRGen::NS(other) if other.name == ns.name)
                });
                if dup {
                    return Ok(());
                }
            }
        }

        set.records.push(rr);
        Ok(())
    }
}

/// The result of a [`ZoneTree::find`] walk.
pub struct FindResult {
    pub node: NodeRef,
    /// Number of query labels consumed. Less than the query's label count
    /// means the walk stopped short — NXDOMAIN below `node` — unless
    /// `wildcard` is set, in which case all labels were synthetically
    /// consumed by the matched `*` node.
    pub matched: usize,
    /// The closest delegation point crossed while descending, if any.
    pub zonecut: Option<NodeRef>,
    pub wildcard: bool,
}

/// A label-keyed tree spanning one or more zones' data. Zones are
/// distinguished by apex markers ([`ZoneInfo`]) on their root node; a single
/// tree can hold a parent zone and a delegated child zone side by side, the
/// way a real nameserver's zone index does.
pub struct ZoneTree {
    pub root: NodeRef,
}

impl Default for ZoneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneTree {
    pub fn new() -> ZoneTree {
        ZoneTree {
            root: Arc::new(RwLock::new(ZoneNode::new(None, None))),
        }
    }

    /// Idempotently walks/creates nodes for `name`, rightmost label first.
    pub fn add(&self, name: &Name) -> NodeRef {
        let mut current = self.root.clone();
        for label in name.labels().iter().rev() {
            let next = {
                let mut node = current.write().unwrap();
                node.children
                    .entry(label.clone())
                    .or_insert_with(|| {
                        Arc::new(RwLock::new(ZoneNode::new(
                            Some(label.clone()),
                            Some(Arc::downgrade(&current)),
                        )))
                    })
                    .clone()
            };
            current = next;
        }
        current
    }

    /// Marks `name`'s node as a zone apex, creating it if necessary, and
    /// returns it.
    pub fn add_zone(&self, origin: Name) -> NodeRef {
        let node = self.add(&origin);
        node.write().unwrap().zone = Some(ZoneInfo { origin });
        node
    }

    /// Finds the zone apex that should answer for `name`: the node addressed
    /// by `name` if it (or an ancestor) is an apex, walking upward from
    /// there. Returns `None` if no zone in this tree covers `name`.
    pub fn best_zone(&self, name: &Name) -> Option<NodeRef> {
        let r = Self::find_from(&self.root, name, false);
        let mut node = r.node;
        loop {
            if node.read().unwrap().is_apex() {
                return Some(node);
            }
            let parent = node.read().unwrap().parent.as_ref().and_then(|w| w.upgrade());
            match parent {
                Some(p) => node = p,
                None => return None,
            }
        }
    }

    /// Descends from `apex` following `qname`'s labels rightmost-first,
    /// stopping at the first delegation crossed. `qname` must already be
    /// relative to `apex`.
    pub fn find(apex: &NodeRef, qname: &Name, wildcards: bool) -> FindResult {
        Self::find_from(apex, qname, wildcards)
    }

    fn find_from(start: &NodeRef, qname: &Name, wildcards: bool) -> FindResult {
        let labels = qname.labels();
        let mut current = start.clone();
        let mut matched = 0usize;
        let mut zonecut = None;
        let mut idx = labels.len();

        while idx > 0 {
            let label = &labels[idx - 1];
            let child = current.read().unwrap().children.get(label).cloned();
            match child {
                Some(next) => {
                    current = next;
                    idx -= 1;
                    matched += 1;
                    if current.read().unwrap().is_delegation() {
                        zonecut = Some(current.clone());
                        break;
                    }
                }
                None => {
                    if wildcards {
                        if let Some(w) = wildcard_label()
                            .ok()
                            .and_then(|wl| current.read().unwrap().children.get(&wl).cloned())
                        {
                            return FindResult {
                                node: w,
                                matched: labels.len(),
                                zonecut,
                                wildcard: true,
                            };
                        }
                    }
                    return FindResult {
                        node: current,
                        matched,
                        zonecut,
                        wildcard: false,
                    };
                }
            }
        }

        FindResult {
            node: current,
            matched,
            zonecut,
            wildcard: false,
        }
    }

    /// Pre-order traversal of `apex`'s descendants for AXFR, skipping any
    /// subtree rooted at a different zone apex (a delegated child zone's own
    /// contents aren't part of this zone's transfer). Yields each
    /// descendant's absolute name alongside the node.
    pub fn axfr_nodes(apex: &NodeRef) -> Vec<(Name, NodeRef)> {
        let mut out = Vec::new();
        Self::walk(apex, &mut out);
        out
    }

    fn walk(node: &NodeRef, out: &mut Vec<(Name, NodeRef)>) {
        let children: Vec<NodeRef> = node.read().unwrap().children.values().cloned().collect();
        for child in children {
            let is_other_apex = child.read().unwrap().is_apex();
            let name = ZoneNode::absolute_name(&child);
            if child.read().unwrap().has_any_rrset() {
                out.push((name, child.clone()));
            }
            if !is_other_apex {
                Self::walk(&child, out);
            }
        }
    }
}

fn wildcard_label() -> Result<Label, crate::errors::ParseError> {
    Label::new(b"*".to_vec())
}

/// Reads a simplified presentation-format zone file into a fresh
/// [`ZoneTree`]: optional `$ORIGIN`/`$TTL` directives, then one record per
/// line as `name ttl class type rdata`. `@` refers to the current origin;
/// any other name not ending in `.` is taken relative to it.
pub fn load_zones(path: &Path) -> Result<ZoneTree, ZoneError> {
    let contents = std::fs::read_to_string(path)?;
    let tree = ZoneTree::new();

    let mut origin = Name::root();
    let mut default_ttl = DEFAULT_TTL;
    let mut apex: Option<NodeRef> = None;

    for (lineno, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("$ORIGIN") {
            origin = Name::from_str(rest.trim())?;
            continue;
        }
        if let Some(rest) = line.strip_prefix("$TTL") {
            default_ttl = Duration::from_secs(
                rest.trim()
                    .parse()
                    .map_err(|_| ZoneError::Parse(crate::errors::ParseError::Message(format!(
                        "line {}: invalid $TTL value",
                        lineno + 1
                    ))))?,
            );
            continue;
        }

        let fields: Vec<&str> = line.splitn(5, char::is_whitespace).collect();
        if fields.len() < 5 {
            return Err(ZoneError::Parse(crate::errors::ParseError::Message(
                format!("line {}: expected 'name ttl class type rdata'", lineno + 1),
            )));
        }
        let [owner_f, ttl_f, class_f, type_f, rdata_f]: [&str; 5] =
            fields.try_into().unwrap();

        if !class_f.eq_ignore_ascii_case("IN") {
            return Err(ZoneError::Parse(crate::errors::ParseError::Message(
                format!("line {}: only IN class zone data is supported", lineno + 1),
            )));
        }

        let owner = if owner_f == "@" {
            origin.clone()
        } else {
            let mut n = Name::from_str(owner_f)?;
            if !owner_f.ends_with('.') {
                n += origin.clone();
            }
            n
        };

        let ttl = if ttl_f == "-" {
            default_ttl
        } else {
            Duration::from_secs(ttl_f.parse().map_err(|_| {
                ZoneError::Parse(crate::errors::ParseError::Message(format!(
                    "line {}: invalid ttl",
                    lineno + 1
                )))
            })?)
        };

        let rtype = DNSType::from_str(type_f).map_err(|_| {
            ZoneError::Parse(crate::errors::ParseError::Message(format!(
                "line {}: unknown record type '{}'",
                lineno + 1,
                type_f
            )))
        })?;

        // Record data follows ordinary zone-file convention: names inside
        // rdata (MX exchanges, NS/CNAME targets, SOA mname/rname, ...) are
        // written fully qualified with a trailing '.'; only owner names may
        // be written relative to `$ORIGIN`.
        let rdata = crate::rr::RRGen::parse_presentation(rtype, rdata_f)
            .map_err(|e| ZoneError::Parse(crate::errors::ParseError::Message(e.to_string())))?;

        let node = tree.add(&{
            let mut rel = owner.clone();
            rel.make_relative(&origin);
            rel
        });

        if owner == origin && apex.is_none() {
            node.write().unwrap().zone = Some(ZoneInfo {
                origin: origin.clone(),
            });
            apex = Some(node.clone());
        }

        node.write().unwrap().insert(rdata, ttl)?;
    }

    match apex {
        Some(a) if a.read().unwrap().rrset(DNSType::SOA).is_some() => Ok(tree),
        _ => Err(ZoneError::MissingSoa(origin.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TempZoneFile(std::path::PathBuf);

    impl TempZoneFile {
        fn path(&self) -> &std::path::Path {
            &self.0
        }
    }

    impl Drop for TempZoneFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn write_zone(contents: &str) -> TempZoneFile {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("tdns-zone-test-{}-{}.zone", std::process::id(), n));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        TempZoneFile(path)
    }

    const SAMPLE: &str = "\
$ORIGIN nl.
$TTL 3600
@     3600 IN SOA  ns1.nl. hostmaster.nl. 1 7200 3600 1209600 3600
@     3600 IN NS   ns1.nl.
ns1   3600 IN A    1.2.3.4
*     3600 IN A    5.6.7.8
www   3600 IN CNAME server1.nl.
server1 3600 IN A  1.2.3.4
fra   3600 IN NS   ns1.fra.nl.
ns1.fra 3600 IN A  12.13.14.15
";

    #[test]
    fn loads_and_finds_exact_match() {
        let f = write_zone(SAMPLE);
        let tree = load_zones(f.path()).unwrap();
        let apex = tree.best_zone(&Name::from_str("nl").unwrap()).unwrap();
        let origin = apex.read().unwrap().zone.as_ref().unwrap().origin.clone();

        let mut qname = Name::from_str("ns1.nl").unwrap();
        qname.make_relative(&origin);
        let r = ZoneTree::find(&apex, &qname, true);
        assert_eq!(r.matched, qname.len());
        assert!(!r.wildcard);
        assert!(r.node.read().unwrap().rrset(DNSType::A).is_some());
    }

    #[test]
    fn wildcard_matches_any_descendant() {
        let f = write_zone(SAMPLE);
        let tree = load_zones(f.path()).unwrap();
        let apex = tree.best_zone(&Name::from_str("nl").unwrap()).unwrap();
        let origin = apex.read().unwrap().zone.as_ref().unwrap().origin.clone();

        let mut qname = Name::from_str("anything.nl").unwrap();
        qname.make_relative(&origin);
        let r = ZoneTree::find(&apex, &qname, true);
        assert!(r.wildcard);
        assert_eq!(r.matched, qname.len());
    }

    #[test]
    fn delegation_is_detected() {
        let f = write_zone(SAMPLE);
        let tree = load_zones(f.path()).unwrap();
        let apex = tree.best_zone(&Name::from_str("nl").unwrap()).unwrap();
        let origin = apex.read().unwrap().zone.as_ref().unwrap().origin.clone();

        let mut qname = Name::from_str("x.fra.nl").unwrap();
        qname.make_relative(&origin);
        let r = ZoneTree::find(&apex, &qname, true);
        assert!(r.zonecut.is_some());
    }

    #[test]
    fn cname_conflict_rejected() {
        let node = Arc::new(RwLock::new(ZoneNode::new(None, None)));
        node.write().unwrap()
            .insert(
                RRGen::A(crate::rr::A { addr: 0 }),
                Duration::from_secs(1),
            )
            .unwrap();
        let err = node.write().unwrap().insert(
            RRGen::CNAME(crate::rr::Cname {
                name: Name::root(),
            }),
            Duration::from_secs(1),
        );
        assert!(err.is_err());
    }

    #[test]
    fn axfr_order_starts_and_ends_conceptually_around_soa() {
        let f = write_zone(SAMPLE);
        let tree = load_zones(f.path()).unwrap();
        let apex = tree.best_zone(&Name::from_str("nl").unwrap()).unwrap();
        let nodes = ZoneTree::axfr_nodes(&apex);
        // fra's own contents (none loaded here) are excluded, but the
        // delegation node itself (carrying NS) is included.
        assert!(nodes.iter().any(|(n, _)| n.to_string() == "fra.nl."));
    }
}
