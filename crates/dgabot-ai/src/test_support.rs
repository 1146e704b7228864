//! Tiny ONNX graphs built in-process so inference can be tested without a
//! trained model.
//!
//! Every graph scores a row as the mean of its encoded values, so the
//! expected output for any domain can be worked out by hand. Only the ONNX
//! message fields these graphs use are declared.

use std::io::Write;

use prost::Message;
use tempfile::NamedTempFile;

// TensorProto.DataType
pub const FLOAT: i32 = 1;
pub const INT32: i32 = 6;
pub const INT64: i32 = 7;

// AttributeProto.AttributeType
const ATTR_INT: i32 = 2;
const ATTR_INTS: i32 = 7;

#[derive(Clone, PartialEq, Message)]
struct ModelProto {
    #[prost(int64, tag = "1")]
    ir_version: i64,
    #[prost(string, tag = "2")]
    producer_name: String,
    #[prost(message, optional, tag = "7")]
    graph: Option<GraphProto>,
    #[prost(message, repeated, tag = "8")]
    opset_import: Vec<OperatorSetIdProto>,
}

#[derive(Clone, PartialEq, Message)]
struct OperatorSetIdProto {
    #[prost(string, tag = "1")]
    domain: String,
    #[prost(int64, tag = "2")]
    version: i64,
}

#[derive(Clone, PartialEq, Message)]
struct GraphProto {
    #[prost(message, repeated, tag = "1")]
    node: Vec<NodeProto>,
    #[prost(string, tag = "2")]
    name: String,
    #[prost(message, repeated, tag = "11")]
    input: Vec<ValueInfoProto>,
    #[prost(message, repeated, tag = "12")]
    output: Vec<ValueInfoProto>,
}

#[derive(Clone, PartialEq, Message)]
struct NodeProto {
    #[prost(string, repeated, tag = "1")]
    input: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    output: Vec<String>,
    #[prost(string, tag = "4")]
    op_type: String,
    #[prost(message, repeated, tag = "5")]
    attribute: Vec<AttributeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct AttributeProto {
    #[prost(string, tag = "1")]
    name: String,
    /// Explicit presence: the runtime distinguishes an unset `i` from `0`.
    #[prost(int64, optional, tag = "3")]
    i: Option<i64>,
    #[prost(int64, repeated, packed = "false", tag = "8")]
    ints: Vec<i64>,
    #[prost(int32, tag = "20")]
    r#type: i32,
}

#[derive(Clone, PartialEq, Message)]
struct ValueInfoProto {
    #[prost(string, tag = "1")]
    name: String,
    #[prost(message, optional, tag = "2")]
    r#type: Option<TypeProto>,
}

/// `TypeProto` with only the `tensor_type` arm of its oneof.
#[derive(Clone, PartialEq, Message)]
struct TypeProto {
    #[prost(message, optional, tag = "1")]
    tensor_type: Option<TensorTypeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TensorTypeProto {
    #[prost(int32, tag = "1")]
    elem_type: i32,
    #[prost(message, optional, tag = "2")]
    shape: Option<TensorShapeProto>,
}

#[derive(Clone, PartialEq, Message)]
struct TensorShapeProto {
    #[prost(message, repeated, tag = "1")]
    dim: Vec<Dimension>,
}

/// One of `dim_value` / `dim_param` is set.
#[derive(Clone, PartialEq, Message)]
struct Dimension {
    #[prost(int64, optional, tag = "1")]
    dim_value: Option<i64>,
    #[prost(string, optional, tag = "2")]
    dim_param: Option<String>,
}

/// Tensor value info; `None` dims are symbolic (`batch`).
fn value_info(name: &str, elem_type: i32, dims: &[Option<i64>]) -> ValueInfoProto {
    let dim = dims
        .iter()
        .map(|d| Dimension {
            dim_value: *d,
            dim_param: d.is_none().then(|| "batch".to_string()),
        })
        .collect();
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            tensor_type: Some(TensorTypeProto {
                elem_type,
                shape: Some(TensorShapeProto { dim }),
            }),
        }),
    }
}

fn node(op_type: &str, input: &str, output: &str, attribute: Vec<AttributeProto>) -> NodeProto {
    NodeProto {
        input: vec![input.to_string()],
        output: vec![output.to_string()],
        op_type: op_type.to_string(),
        attribute,
    }
}

fn attr_int(name: &str, i: i64) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        i: Some(i),
        ints: vec![],
        r#type: ATTR_INT,
    }
}

fn attr_ints(name: &str, ints: &[i64]) -> AttributeProto {
    AttributeProto {
        name: name.to_string(),
        i: None,
        ints: ints.to_vec(),
        r#type: ATTR_INTS,
    }
}

/// Serialised model: `encoded [batch, width] -> score`, where score is the
/// row mean. `keepdims` selects `[batch, 1]` or `[batch]` output.
pub fn mean_model(input_elem: i32, width: Option<i64>, keepdims: bool) -> Vec<u8> {
    let mut nodes = Vec::new();
    let mut reduce_input = "encoded";
    if input_elem != FLOAT {
        nodes.push(node("Cast", "encoded", "encoded_f", vec![attr_int("to", FLOAT as i64)]));
        reduce_input = "encoded_f";
    }
    nodes.push(node(
        "ReduceMean",
        reduce_input,
        "score",
        vec![attr_ints("axes", &[1]), attr_int("keepdims", keepdims as i64)],
    ));

    let output_dims: &[Option<i64>] = if keepdims { &[None, Some(1)] } else { &[None] };
    let graph = GraphProto {
        node: nodes,
        name: "row_mean".to_string(),
        input: vec![value_info("encoded", input_elem, &[None, width])],
        output: vec![value_info("score", FLOAT, output_dims)],
    };

    ModelProto {
        ir_version: 8,
        producer_name: "dgabot-tests".to_string(),
        graph: Some(graph),
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
    }
    .encode_to_vec()
}

/// Write model bytes to a temp `.onnx` file that lives as long as the handle.
pub fn write_model(bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".onnx")
        .tempfile()
        .unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Default test model: int64 input, dynamic width, `[batch, 1]` output.
pub fn row_mean_model() -> NamedTempFile {
    write_model(&mean_model(INT64, None, true))
}
