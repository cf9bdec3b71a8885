//! Component definitions - the build recipe for every vendored package.
//!
//! Most packages follow the autotools pattern: configure into the target
//! prefix, `make -j`, `make install`. The rest add a post-install move, a
//! patch, or a plain copy.

use super::{extract, in_source, run, Component, Dir, Op};

const CONFIGURE: Op = in_source("./configure --prefix=\"{prefix}\"");
const MAKE: Op = in_source("make -j {jobs}");
const MAKE_INSTALL: Op = in_source("make install");

pub static TINC: Component = Component {
    name: "tinc",
    description: "build tinc",
    ops: &[extract("tinc"), CONFIGURE, MAKE, MAKE_INSTALL],
};

pub static MEMCACHED: Component = Component {
    name: "memcached",
    description: "build memcached",
    ops: &[
        extract("memcached"),
        in_source("./configure --prefix=\"{prefix}\" --enable-sasl"),
        MAKE,
        MAKE_INSTALL,
    ],
};

pub static PYTHON: Component = Component {
    name: "python",
    description: "build the python interpreter",
    ops: &[
        extract("Python"),
        in_source("./configure --prefix=\"{prefix}\"  --libdir=\"{prefix}\"/lib --enable-shared"),
        MAKE,
        MAKE_INSTALL,
    ],
};

pub static NGINX: Component = Component {
    name: "nginx",
    description: "build the nginx web server",
    ops: &[
        extract("nginx"),
        in_source("./configure --without-http_rewrite_module --prefix=\"{prefix}\""),
        MAKE,
        MAKE_INSTALL,
        run("mv sbin/nginx bin/", Dir::Target),
    ],
};

/// haproxy has no configure step. The patch lets log.c write to a file
/// instead of syslog.
pub static HAPROXY: Component = Component {
    name: "haproxy",
    description: "build the haproxy server",
    ops: &[
        extract("haproxy"),
        in_source("patch -p0 < {patches}/haproxy.patch"),
        in_source("make -j {jobs} TARGET={make_target}"),
        in_source("cp haproxy \"{prefix}\"/bin/"),
    ],
};

pub static STUNNEL: Component = Component {
    name: "stunnel",
    description: "build the stunnel server",
    ops: &[
        extract("stunnel"),
        CONFIGURE,
        MAKE,
        // install asks for certificate details on stdin otherwise
        in_source("make install < /dev/null"),
    ],
};

pub static POSTGRESQL: Component = Component {
    name: "postgresql",
    description: "build the postgresql database server",
    ops: &[extract("postgresql"), CONFIGURE, MAKE, MAKE_INSTALL],
};

/// Cassandra ships as a binary distribution: copy it under the prefix,
/// drop the bundled conf and install the start script.
pub static CASSANDRA: Component = Component {
    name: "cassandra",
    description: "build the cassandra database server",
    ops: &[
        extract("dsc-cassandra"),
        Op::ResetDir(Dir::TargetSub("cassandra")),
        Op::CopyTree {
            from: Dir::Source,
            to: Dir::TargetSub("cassandra"),
        },
        Op::RemoveDir(Dir::TargetSub("cassandra/conf")),
        Op::CopyPatch {
            file: "start-cassandra",
            to: Dir::TargetSub("bin"),
        },
    ],
};

/// Also installs the Python bindings for both the built interpreter and Sage.
pub static PROTOBUF: Component = Component {
    name: "protobuf",
    description: "build Google's protocol buffers compiler",
    ops: &[
        extract("protobuf"),
        CONFIGURE,
        MAKE,
        MAKE_INSTALL,
        run("python setup.py install", Dir::SourceSub("python")),
        run("sage setup.py install", Dir::SourceSub("python")),
    ],
};

/// easy_install runs once distribute is in place.
pub static PYTHON_PACKAGES_COMPONENT: Component = Component {
    name: "python_packages",
    description: "install all Python packages",
    ops: &[
        extract("distribute"),
        in_source("python setup.py install"),
        run(
            "easy_install ipython tornado sockjs-tornado python-memcached python-daemon psycopg2 momoko",
            Dir::TargetSub("bin"),
        ),
        extract("tornado-memcache"),
        in_source("python setup.py install"),
    ],
};

/// Every component, in the order a full build runs them.
pub static ALL: &[&Component] = &[
    &TINC,
    &MEMCACHED,
    &PYTHON,
    &NGINX,
    &HAPROXY,
    &STUNNEL,
    &POSTGRESQL,
    &CASSANDRA,
    &PROTOBUF,
    &PYTHON_PACKAGES_COMPONENT,
];
