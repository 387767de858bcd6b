// m3.rs — Well-known classifier paths and property names
//
// The metamodel is addressed by element path (package-qualified, `Root`
// omitted). These constants are the only place classifier and property
// names are spelled out; every other module refers to them by constant.

/// Classifier element paths.
pub mod paths {
    pub const ANY: &str = "meta::pure::metamodel::type::Any";
    pub const MODEL_ELEMENT: &str = "meta::pure::metamodel::ModelElement";
    pub const PACKAGEABLE_ELEMENT: &str = "meta::pure::metamodel::PackageableElement";
    pub const PACKAGE: &str = "meta::pure::metamodel::Package";

    pub const TYPE: &str = "meta::pure::metamodel::type::Type";
    pub const CLASS: &str = "meta::pure::metamodel::type::Class";
    pub const DATA_TYPE: &str = "meta::pure::metamodel::type::DataType";
    pub const PRIMITIVE_TYPE: &str = "meta::pure::metamodel::type::PrimitiveType";
    pub const ENUMERATION: &str = "meta::pure::metamodel::type::Enumeration";
    pub const ENUM: &str = "meta::pure::metamodel::type::Enum";
    pub const UNIT: &str = "meta::pure::metamodel::type::Unit";
    pub const MEASURE: &str = "meta::pure::metamodel::type::Measure";
    pub const FUNCTION_TYPE: &str = "meta::pure::metamodel::type::FunctionType";
    pub const GENERIC_TYPE: &str = "meta::pure::metamodel::type::generics::GenericType";
    pub const GENERALIZATION: &str = "meta::pure::metamodel::relationship::Generalization";

    pub const FUNCTION: &str = "meta::pure::metamodel::function::Function";
    pub const FUNCTION_DEFINITION: &str = "meta::pure::metamodel::function::FunctionDefinition";
    pub const CONCRETE_FUNCTION_DEFINITION: &str =
        "meta::pure::metamodel::function::ConcreteFunctionDefinition";
    pub const LAMBDA_FUNCTION: &str = "meta::pure::metamodel::function::LambdaFunction";
    pub const NATIVE_FUNCTION: &str = "meta::pure::metamodel::function::NativeFunction";
    pub const ABSTRACT_PROPERTY: &str =
        "meta::pure::metamodel::function::property::AbstractProperty";
    pub const PROPERTY: &str = "meta::pure::metamodel::function::property::Property";
    pub const QUALIFIED_PROPERTY: &str =
        "meta::pure::metamodel::function::property::QualifiedProperty";
    pub const CONSTRAINT: &str = "meta::pure::metamodel::constraint::Constraint";

    pub const VALUE_SPECIFICATION: &str =
        "meta::pure::metamodel::valuespecification::ValueSpecification";
    pub const INSTANCE_VALUE: &str = "meta::pure::metamodel::valuespecification::InstanceValue";
    pub const FUNCTION_EXPRESSION: &str =
        "meta::pure::metamodel::valuespecification::FunctionExpression";
    pub const SIMPLE_FUNCTION_EXPRESSION: &str =
        "meta::pure::metamodel::valuespecification::SimpleFunctionExpression";
    pub const VARIABLE_EXPRESSION: &str =
        "meta::pure::metamodel::valuespecification::VariableExpression";
    pub const KEY_EXPRESSION: &str = "meta::pure::functions::lang::KeyExpression";

    pub const IMPORT_STUB: &str = "meta::pure::metamodel::import::ImportStub";
    pub const PROPERTY_STUB: &str = "meta::pure::metamodel::import::PropertyStub";
    pub const ENUM_STUB: &str = "meta::pure::metamodel::import::EnumStub";

    /// Primitive types live directly under `Root`.
    pub const PRIMITIVES: &[&str] = &[
        "String",
        "Integer",
        "Float",
        "Decimal",
        "Number",
        "Boolean",
        "Date",
        "StrictDate",
        "DateTime",
        "StrictTime",
        "LatestDate",
        "Byte",
    ];
}

/// Property names.
pub mod props {
    pub const PACKAGE: &str = "package";
    pub const CHILDREN: &str = "children";
    pub const GENERALIZATIONS: &str = "generalizations";
    pub const GENERAL: &str = "general";
    pub const RAW_TYPE: &str = "rawType";
    pub const TYPE_ARGUMENTS: &str = "typeArguments";
    pub const PROPERTIES: &str = "properties";
    pub const QUALIFIED_PROPERTIES: &str = "qualifiedProperties";
    pub const CONSTRAINTS: &str = "constraints";
    pub const FUNCTION_DEFINITION: &str = "functionDefinition";
    pub const FUNCTION_TYPE: &str = "functionType";
    pub const RETURN_TYPE: &str = "returnType";
    pub const PARAMETERS: &str = "parameters";
    pub const GENERIC_TYPE: &str = "genericType";
    pub const EXPRESSION_SEQUENCE: &str = "expressionSequence";
    pub const VALUES: &str = "values";
    pub const FUNC: &str = "func";
    pub const PARAMETERS_VALUES: &str = "parametersValues";
    pub const EXPRESSION: &str = "expression";
    pub const KEY: &str = "key";
    pub const MEASURE: &str = "measure";
    pub const CANONICAL_UNIT: &str = "canonicalUnit";
    pub const RESOLVED_NODE: &str = "resolvedNode";
    pub const RESOLVED_PROPERTY: &str = "resolvedProperty";
    pub const RESOLVED_ENUM: &str = "resolvedEnum";
}

/// Name of the root package; omitted from element paths.
pub const ROOT_PACKAGE: &str = "Root";
