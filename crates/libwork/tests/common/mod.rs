//! In-memory version-control fake for exercising the checkpoint lifecycle.
#![allow(dead_code)]

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::Mutex,
};

use libwork::{Result, Vcs, WorkError};

/// File name to contents.
pub type Tree = BTreeMap<String, String>;

/// A commit in a fake repository.
#[derive(Debug, Clone)]
pub struct Commit {
    pub parent: Option<String>,
    pub message: String,
    pub tree: Tree,
}

/// Recorded push invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Push {
    pub remote: String,
    pub refspec: String,
    pub force: bool,
}

/// State of one fake repository.
#[derive(Debug, Clone)]
pub struct Repo {
    pub commits: HashMap<String, Commit>,
    pub branches: BTreeMap<String, String>,
    pub head: String,
    pub index: Tree,
    pub worktree: Tree,
    pub remotes: BTreeSet<String>,
    pub pushes: Vec<Push>,
}

impl Repo {
    pub fn head_commit(&self) -> &str {
        &self.branches[&self.head]
    }

    pub fn head_tree(&self) -> &Tree {
        &self.commits[self.head_commit()].tree
    }

    fn resolve(&self, reference: &str) -> Option<String> {
        if let Some(id) = self.branches.get(reference) {
            return Some(id.clone());
        }
        self.commits.contains_key(reference).then(|| reference.to_string())
    }
}

/// Carry local modifications from `current` onto `target`, like a checkout
/// that does not conflict.
fn carry(local: &Tree, current: &Tree, target: &Tree) -> Tree {
    let mut keys: BTreeSet<&String> = local.keys().collect();
    keys.extend(current.keys());
    keys.extend(target.keys());

    let mut out = Tree::new();
    for key in keys {
        let value = if local.get(key) == current.get(key) {
            target.get(key)
        } else {
            local.get(key)
        };
        if let Some(value) = value {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

#[derive(Default)]
struct State {
    repos: BTreeMap<PathBuf, Repo>,
    calls: Vec<String>,
    fail_steps: BTreeSet<String>,
    next_id: usize,
}

/// Fake [`Vcs`] holding any number of repositories keyed by root path.
#[derive(Default)]
pub struct FakeVcs {
    state: Mutex<State>,
}

fn failed(step: &str, message: &str) -> WorkError {
    WorkError::VcsCommandFailed {
        step: step.to_string(),
        message: message.to_string(),
    }
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository at `root` on `primary` with one commit of `files`.
    pub fn add_repo(&self, root: impl Into<PathBuf>, primary: &str, files: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("c{}", state.next_id);
        let tree: Tree = files
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();

        let repo = Repo {
            commits: HashMap::from([(
                id.clone(),
                Commit {
                    parent: None,
                    message: "Initial commit".to_string(),
                    tree: tree.clone(),
                },
            )]),
            branches: BTreeMap::from([(primary.to_string(), id)]),
            head: primary.to_string(),
            index: tree.clone(),
            worktree: tree,
            remotes: BTreeSet::new(),
            pushes: Vec::new(),
        };
        state.repos.insert(root.into(), repo);
    }

    pub fn add_remote(&self, root: &Path, remote: &str) {
        self.with_repo(root, |repo| {
            repo.remotes.insert(remote.to_string());
        });
    }

    /// Write a file into the working tree without staging it.
    pub fn write(&self, root: &Path, name: &str, body: &str) {
        self.with_repo(root, |repo| {
            repo.worktree.insert(name.to_string(), body.to_string());
        });
    }

    /// Commit `name` directly on the named branch, advancing it.
    pub fn commit_on(&self, root: &Path, branch: &str, name: &str, body: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("c{}", state.next_id);
        let repo = state.repos.get_mut(root).unwrap();
        let parent = repo.branches[branch].clone();
        let mut tree = repo.commits[&parent].tree.clone();
        tree.insert(name.to_string(), body.to_string());
        repo.commits.insert(
            id.clone(),
            Commit {
                parent: Some(parent),
                message: format!("Add {name}"),
                tree: tree.clone(),
            },
        );
        repo.branches.insert(branch.to_string(), id.clone());
        if repo.head == branch {
            repo.index = tree.clone();
            repo.worktree = tree;
        }
        id
    }

    /// Make every call whose step starts with `step` fail.
    pub fn fail_on(&self, step: &str) {
        self.state.lock().unwrap().fail_steps.insert(step.to_string());
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().fail_steps.clear();
    }

    pub fn repo(&self, root: &Path) -> Repo {
        self.state.lock().unwrap().repos[root].clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Calls that change repository or remote state.
    pub fn mutating_calls(&self) -> Vec<String> {
        const READS: [&str; 7] = [
            "rev-parse",
            "branch --list",
            "remote",
            "status",
            "merge-base",
            "show-toplevel",
            "status --porcelain",
        ];
        self.calls()
            .into_iter()
            .filter(|call| !READS.iter().any(|read| call.starts_with(read)))
            .collect()
    }

    fn with_repo<T>(&self, root: &Path, f: impl FnOnce(&mut Repo) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(state.repos.get_mut(root).unwrap())
    }

    /// Record `step` and run `f` against the repository at `root`.
    fn run<T>(
        &self,
        root: &Path,
        step: String,
        f: impl FnOnce(&mut Repo, &mut usize) -> std::result::Result<T, String>,
    ) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(step.clone());
        if state.fail_steps.iter().any(|prefix| step.starts_with(prefix)) {
            return Err(failed(&step, "scripted failure"));
        }
        let State { repos, next_id, .. } = &mut *state;
        let repo = repos
            .get_mut(root)
            .ok_or_else(|| failed(&step, "not a git repository"))?;
        f(repo, next_id).map_err(|message| failed(&step, &message))
    }
}

impl Vcs for FakeVcs {
    fn resolve_toplevel(&self, path: &Path) -> Result<PathBuf> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("show-toplevel {}", path.display()));
        state
            .repos
            .keys()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
            .ok_or_else(|| failed("rev-parse --show-toplevel", "not a git repository"))
    }

    fn branch_exists(&self, repo: &Path, name: &str) -> Result<bool> {
        self.run(repo, format!("branch --list {name}"), |r, _| {
            Ok(r.branches.contains_key(name))
        })
    }

    fn remote_exists(&self, repo: &Path, name: &str) -> Result<bool> {
        self.run(repo, "remote".to_string(), |r, _| Ok(r.remotes.contains(name)))
    }

    fn is_clean(&self, repo: &Path) -> Result<bool> {
        self.run(repo, "status --porcelain".to_string(), |r, _| {
            Ok(&r.worktree == r.head_tree() && &r.index == r.head_tree())
        })
    }

    fn rev_parse(&self, repo: &Path, reference: &str) -> Result<String> {
        self.run(repo, format!("rev-parse {reference}"), |r, _| {
            r.resolve(reference)
                .ok_or_else(|| format!("unknown revision {reference}"))
        })
    }

    fn is_ancestor(&self, repo: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        self.run(
            repo,
            format!("merge-base --is-ancestor {ancestor} {descendant}"),
            |r, _| {
                let target = r.resolve(ancestor).ok_or("unknown ancestor")?;
                let mut cursor = r.resolve(descendant);
                while let Some(id) = cursor {
                    if id == target {
                        return Ok(true);
                    }
                    cursor = r.commits[&id].parent.clone();
                }
                Ok(false)
            },
        )
    }

    fn checkout(&self, repo: &Path, reference: &str, create: bool) -> Result<()> {
        let step = if create {
            format!("checkout -B {reference}")
        } else {
            format!("checkout {reference}")
        };
        self.run(repo, step, |r, _| {
            if create {
                let head = r.head_commit().to_string();
                r.branches.insert(reference.to_string(), head);
            }
            let target = r
                .branches
                .get(reference)
                .cloned()
                .ok_or_else(|| format!("pathspec '{reference}' did not match"))?;
            let current = r.head_tree().clone();
            let target_tree = r.commits[&target].tree.clone();
            r.worktree = carry(&r.worktree, &current, &target_tree);
            r.index = carry(&r.index, &current, &target_tree);
            r.head = reference.to_string();
            Ok(())
        })
    }

    fn reset(&self, repo: &Path, commit: &str) -> Result<()> {
        self.run(repo, format!("reset {commit}"), |r, _| {
            let id = r.resolve(commit).ok_or("unknown commit")?;
            r.index = r.commits[&id].tree.clone();
            let head = r.head.clone();
            r.branches.insert(head, id);
            Ok(())
        })
    }

    fn delete_branch(&self, repo: &Path, name: &str) -> Result<()> {
        self.run(repo, format!("branch --delete {name}"), |r, _| {
            if r.head == name {
                return Err(format!("cannot delete branch '{name}' checked out"));
            }
            r.branches
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| format!("branch '{name}' not found"))
        })
    }

    fn add_all(&self, repo: &Path) -> Result<()> {
        self.run(repo, "add".to_string(), |r, _| {
            r.index = r.worktree.clone();
            Ok(())
        })
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        self.run(repo, "commit".to_string(), |r, next_id| {
            if &r.index == r.head_tree() {
                return Err("nothing to commit".to_string());
            }
            *next_id += 1;
            let id = format!("c{next_id}");
            let parent = r.head_commit().to_string();
            r.commits.insert(
                id.clone(),
                Commit {
                    parent: Some(parent),
                    message: message.to_string(),
                    tree: r.index.clone(),
                },
            );
            let head = r.head.clone();
            r.branches.insert(head, id);
            Ok(())
        })
    }

    fn push(&self, repo: &Path, remote: &str, refspec: &str, force: bool) -> Result<()> {
        self.run(repo, format!("push {remote} {refspec}"), |r, _| {
            if !r.remotes.contains(remote) {
                return Err(format!("'{remote}' does not appear to be a git repository"));
            }
            r.pushes.push(Push {
                remote: remote.to_string(),
                refspec: refspec.to_string(),
                force,
            });
            Ok(())
        })
    }

    fn status(&self, repo: &Path) -> Result<String> {
        self.run(repo, "status".to_string(), |r, _| {
            Ok(format!("On branch {}\n", r.head))
        })
    }
}
